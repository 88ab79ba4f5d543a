pub mod file;
pub mod peers_csv;
pub mod stdin;
