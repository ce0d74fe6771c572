pub mod synthetic_meter;
