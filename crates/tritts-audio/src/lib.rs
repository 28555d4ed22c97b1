pub mod reconstruct;
pub mod wav;

pub use reconstruct::{Concatenate, CrossFade, Reconstruction};
pub use wav::{load_mono, read_wav, write_wav, WavData};
