pub mod i2c_bus_wapper;
pub mod sensor;
