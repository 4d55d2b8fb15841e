// Interface adapter layer: wire protocol, input normalization, transport.

pub mod input;
pub mod net;
pub mod protocol;
