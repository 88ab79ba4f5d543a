pub mod vc_method;
