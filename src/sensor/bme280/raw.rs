use super::error::Error;
use crate::i2c_bus_wapper::BusPort;

/// 数据寄存器起始地址 (0xF7-0xFE: press_msb .. hum_lsb)
pub const REG_DATA: u8 = 0xF7;
/// 一次突发读取的字节数
pub const DATA_LEN: usize = 8;

/// 一次测量的原始ADC值
///
/// 压力、温度为20位，湿度为16位，均为无符号数。
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RawSample {
    pub pressure: u32,
    pub temperature: u32,
    pub humidity: u32,
}

impl RawSample {
    /// 从0xF7开始突发读取8个字节
    pub fn read<B: BusPort>(bus: &mut B, address: u8) -> Result<Self, Error> {
        let data = bus
            .read_register(address, REG_DATA, DATA_LEN)
            .map_err(|err| Error::bus_read(REG_DATA, err))?;
        Self::from_bytes(&data)
    }

    /// 解析突发读取得到的8个字节
    pub fn from_bytes(data: &[u8]) -> Result<Self, Error> {
        if data.len() < DATA_LEN {
            return Err(Error::short_read(REG_DATA, DATA_LEN, data.len()));
        }

        Ok(Self {
            // 0xF7-0xF9, xlsb低4位无效
            pressure: be_u24(&data[0..3]) >> 4,
            // 0xFA-0xFC
            temperature: be_u24(&data[3..6]) >> 4,
            // 0xFD-0xFE
            humidity: u16::from_be_bytes([data[6], data[7]]) as u32,
        })
    }
}

fn be_u24(b: &[u8]) -> u32 {
    ((b[0] as u32) << 16) | ((b[1] as u32) << 8) | b[2] as u32
}
