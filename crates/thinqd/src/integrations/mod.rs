pub mod lge;
