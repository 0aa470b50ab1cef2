// Analysis module - DSP feature extraction
//
// Everything that turns decoded samples into numbers lives here. The only
// consumer-facing product is the MFCC fingerprint; the framing, mel and DCT
// stages are exposed for diagnostics and tests.

pub mod features;

pub use features::{extract, Fingerprint, MfccExtractor};
