pub mod composite;
pub mod gradient;
pub mod hsv;
pub mod keying;
pub mod morphology;
pub mod pipeline;
pub mod resize;
pub mod tie;
