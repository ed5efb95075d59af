//! Record reshaping
//!
//! Turns exported registry rows into label-keyed objects for API consumers.

pub mod flatten;

pub use flatten::{
    export_record_with_labels, field_labels, flatten_rows, FlattenedInstrument, MAIN_RECORD,
    RECORD_ID_LABEL, REPEAT_INSTANCE_LABEL, REPEAT_INSTRUMENT_LABEL,
};
