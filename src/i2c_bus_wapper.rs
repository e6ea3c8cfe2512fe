use std::fmt::Debug;

use embedded_hal::i2c::I2c;

/// 7位I2C地址中允许普通设备使用的最小地址
const FIRST_DEVICE_ADDR: u8 = 0x08;
/// 7位I2C地址中允许普通设备使用的最大地址
const LAST_DEVICE_ADDR: u8 = 0x77;

/// 寄存器寻址的两线总线端口
///
/// 传感器驱动只依赖这三个原语，不关心底层是树莓派的I2C控制器、
/// 其他主机的I2C外设还是测试用的模拟总线。
pub trait BusPort {
    /// 底层传输错误
    type Error: Debug;

    /// 扫描总线，返回所有应答的7位从设备地址
    fn scan(&mut self) -> Result<Vec<u8>, Self::Error>;

    /// 从`register`开始连续读取`length`个字节
    fn read_register(
        &mut self,
        address: u8,
        register: u8,
        length: usize,
    ) -> Result<Vec<u8>, Self::Error>;

    /// 从`register`开始连续写入`data`
    fn write_register(&mut self, address: u8, register: u8, data: &[u8])
    -> Result<(), Self::Error>;
}

/// I2C Bus Wapper
///
/// 把任意实现了`embedded_hal::i2c::I2c`的总线(例如开启`hal`特性的
/// `rppal::i2c::I2c`)包装成`BusPort`。
pub struct I2cBusWapper<I2C> {
    i2c: I2C,
}

impl<I2C: I2c> I2cBusWapper<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self { i2c }
    }

    /// 取回被包装的总线
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C: I2c> BusPort for I2cBusWapper<I2C> {
    type Error = I2C::Error;

    fn scan(&mut self) -> Result<Vec<u8>, Self::Error> {
        // 和i2cdetect一样: 对每个地址读取1个字节，有应答即认为设备存在
        let mut found = Vec::new();
        let mut byte = [0u8; 1];
        for address in FIRST_DEVICE_ADDR..=LAST_DEVICE_ADDR {
            if self.i2c.read(address, &mut byte).is_ok() {
                found.push(address);
            }
        }
        Ok(found)
    }

    fn read_register(
        &mut self,
        address: u8,
        register: u8,
        length: usize,
    ) -> Result<Vec<u8>, Self::Error> {
        let mut data = vec![0u8; length];
        self.i2c.write_read(address, &[register], &mut data)?;
        Ok(data)
    }

    fn write_register(
        &mut self,
        address: u8,
        register: u8,
        data: &[u8],
    ) -> Result<(), Self::Error> {
        // 寄存器地址后紧跟待写入的数据，一次事务完成
        let mut frame = Vec::with_capacity(data.len() + 1);
        frame.push(register);
        frame.extend_from_slice(data);
        self.i2c.write(address, &frame)
    }
}
