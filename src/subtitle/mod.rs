//! Caption text handling
//!
//! This module turns ASS/SSA caption markup into text for the script editor:
//! - Inline override tag removal and escape code substitution
//! - Dialogue extraction from complete ASS/SSA scripts

pub mod normalize;
pub mod script;

pub use normalize::{normalize, normalize_opt};
pub use script::{parse_script, plain_text, DialogueLine};
