use std::{thread, time::Duration};

use raspi_bme280::i2c_bus_wapper::I2cBusWapper;
use raspi_bme280::sensor::bme280::{BME280, CHIP_ID, Options, Sampling};
use rppal::i2c::I2c;

/// 读取间隔
const READ_INTERVAL: Duration = Duration::from_millis(500);

/// 解析命令行中的从设备地址，例如`0x77`；不传则扫描总线
fn parse_address() -> anyhow::Result<Option<u8>> {
    match std::env::args().nth(1) {
        Some(arg) => {
            let digits = arg.trim_start_matches("0x").trim_start_matches("0X");
            let address = u8::from_str_radix(digits, 16)
                .map_err(|err| anyhow::anyhow!("无效的设备地址{}: {}", arg, err))?;
            Ok(Some(address))
        }
        None => Ok(None),
    }
}

/// BME280传感器测试程序
fn main() -> anyhow::Result<()> {
    // 初始化I2C通信总线
    let i2c_bus = I2cBusWapper::new(I2c::new()?);

    // 创建BME280传感器实例
    let mut options = Options::default().with_sampling(Sampling::X1);
    if let Some(address) = parse_address()? {
        options = options.with_address(address);
    }
    let mut bme280 = BME280::open(i2c_bus, options)?;
    let chip_id = bme280.chip_id()?;
    if chip_id != CHIP_ID {
        eprintln!("芯片ID为0x{:02X}, 可能不是BME280", chip_id);
    }
    println!("BME280就绪: 地址0x{:02X}", bme280.address());

    // 死循环读取传感器数据
    loop {
        thread::sleep(READ_INTERVAL);

        match bme280.sample() {
            // 读取成功
            Ok(reading) => {
                println!("温度:\t{}\t℃", reading.temperature);
                println!("气压:\t{}\thPa", reading.pressure);
                println!("湿度:\t{}\t%", reading.humidity);
                println!("高度:\t{}\tm", reading.altitude);
                println!();
            }
            // 读取失败
            Err(err) => {
                eprintln!("读取BME280传感器数据失败: {}", err);
            }
        }
    }
}
