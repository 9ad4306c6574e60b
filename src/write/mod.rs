//! Format writers: serialize evaluated records through an output template.
//!
//! Writers never see the source document, only canonical records, the
//! rule set, and the template. Field order is always the template's
//! declared order; a record missing a referenced field yields an empty
//! cell/element, never an error; an empty record sequence yields a
//! template-valid empty document.

mod csv;
mod json;
mod xlsx;
mod xml;

pub use self::csv::write_csv;
pub use self::json::write_json;
pub use self::xlsx::write_xlsx;
pub use self::xml::write_xml;
