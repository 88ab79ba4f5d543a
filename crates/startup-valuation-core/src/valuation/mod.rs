pub mod comps;
pub mod dcf;
pub mod inputs;
pub mod peers;
