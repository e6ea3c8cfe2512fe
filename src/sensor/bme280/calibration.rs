use super::error::Error;
use crate::i2c_bus_wapper::BusPort;

/// 温度/压力校准数据块起始寄存器 (0x88-0xA1)
pub const REG_CALIB_00: u8 = 0x88;
/// 温度/压力校准数据块长度
pub const CALIB_00_LEN: usize = 26;
/// 湿度校准数据块起始寄存器 (0xE1-0xE7)
pub const REG_CALIB_26: u8 = 0xE1;
/// 湿度校准数据块长度
pub const CALIB_26_LEN: usize = 7;

/// 校准字段在数据块中的编码方式(小端序)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    U8,
    I8,
    U16,
    I16,
}

impl Width {
    pub const fn size(self) -> usize {
        match self {
            Self::U8 | Self::I8 => 1,
            Self::U16 | Self::I16 => 2,
        }
    }
}

/// 校准数据块中的一个字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub offset: usize,
    pub width: Width,
}

impl Field {
    const fn new(name: &'static str, offset: usize, width: Width) -> Self {
        Self {
            name,
            offset,
            width,
        }
    }

    /// 按字段宽度和符号解码
    fn decode(&self, block: &[u8]) -> i32 {
        let b = &block[self.offset..self.offset + self.width.size()];
        match self.width {
            Width::U8 => b[0] as i32,
            Width::I8 => b[0] as i8 as i32,
            Width::U16 => u16::from_le_bytes([b[0], b[1]]) as i32,
            Width::I16 => i16::from_le_bytes([b[0], b[1]]) as i32,
        }
    }
}

/// 0x88数据块布局，偏移相对于0x88
pub const CALIB_00_LAYOUT: [Field; 14] = [
    Field::new("dig_T1", 0, Width::U16),
    Field::new("dig_T2", 2, Width::I16),
    Field::new("dig_T3", 4, Width::I16),
    Field::new("dig_P1", 6, Width::U16),
    Field::new("dig_P2", 8, Width::I16),
    Field::new("dig_P3", 10, Width::I16),
    Field::new("dig_P4", 12, Width::I16),
    Field::new("dig_P5", 14, Width::I16),
    Field::new("dig_P6", 16, Width::I16),
    Field::new("dig_P7", 18, Width::I16),
    Field::new("dig_P8", 20, Width::I16),
    Field::new("dig_P9", 22, Width::I16),
    // 0xA0 保留
    Field::new("reserved", 24, Width::U8),
    Field::new("dig_H1", 25, Width::U8),
];

/// 0xE1数据块布局，偏移相对于0xE1
///
/// e4/e5/e6三个字节以半字节交错的方式存放dig_H4和dig_H5，
/// 需要在解析后重新拼接。
pub const CALIB_26_LAYOUT: [Field; 6] = [
    Field::new("dig_H2", 0, Width::I16),
    Field::new("dig_H3", 2, Width::U8),
    Field::new("e4", 3, Width::I8),
    Field::new("e5", 4, Width::U8),
    Field::new("e6", 5, Width::I8),
    Field::new("dig_H6", 6, Width::I8),
];

/// BME280传感器校准参数
///
/// 出厂时写入NVM的逐片校准系数，用于温度、压力、湿度的补偿计算。
/// 会话建立时读取一次，之后不再改变；需要重新读取时请重新打开会话。
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Calibration {
    // 温度校准参数组
    pub dig_t1: u16,
    pub dig_t2: i16,
    pub dig_t3: i16,

    // 压力校准参数组
    pub dig_p1: u16,
    pub dig_p2: i16,
    pub dig_p3: i16,
    pub dig_p4: i16,
    pub dig_p5: i16,
    pub dig_p6: i16,
    pub dig_p7: i16,
    pub dig_p8: i16,
    pub dig_p9: i16,

    // 湿度校准参数组
    pub dig_h1: u8,
    pub dig_h2: i16,
    pub dig_h3: u8,
    /// 0xE4[7:0] << 4 | 0xE5[3:0]，有符号12位
    pub dig_h4: i16,
    /// 0xE6[7:0] << 4 | 0xE5[7:4]，有符号12位
    pub dig_h5: i16,
    pub dig_h6: i8,
}

impl Calibration {
    /// 从总线读取两个校准数据块并解析
    ///
    /// 只读取一次，不做重试。
    pub fn read<B: BusPort>(bus: &mut B, address: u8) -> Result<Self, Error> {
        let calib_00 = bus
            .read_register(address, REG_CALIB_00, CALIB_00_LEN)
            .map_err(|err| Error::CalibrationRead {
                register: REG_CALIB_00,
                reason: format!("{:?}", err),
            })?;
        let calib_26 = bus
            .read_register(address, REG_CALIB_26, CALIB_26_LEN)
            .map_err(|err| Error::CalibrationRead {
                register: REG_CALIB_26,
                reason: format!("{:?}", err),
            })?;

        Self::parse(&calib_00, &calib_26)
    }

    /// 解析0x88开始的26字节和0xE1开始的7字节
    pub fn parse(calib_00: &[u8], calib_26: &[u8]) -> Result<Self, Error> {
        check_len(REG_CALIB_00, calib_00, CALIB_00_LEN)?;
        check_len(REG_CALIB_26, calib_26, CALIB_26_LEN)?;

        let [t1, t2, t3, p1, p2, p3, p4, p5, p6, p7, p8, p9, _reserved, h1] =
            CALIB_00_LAYOUT.map(|field| field.decode(calib_00));
        let [h2, h3, e4, e5, e6, h6] = CALIB_26_LAYOUT.map(|field| field.decode(calib_26));

        let (dig_h4, dig_h5) = reconstruct_h4_h5(e4, e5, e6);

        Ok(Self {
            dig_t1: t1 as u16,
            dig_t2: t2 as i16,
            dig_t3: t3 as i16,
            dig_p1: p1 as u16,
            dig_p2: p2 as i16,
            dig_p3: p3 as i16,
            dig_p4: p4 as i16,
            dig_p5: p5 as i16,
            dig_p6: p6 as i16,
            dig_p7: p7 as i16,
            dig_p8: p8 as i16,
            dig_p9: p9 as i16,
            dig_h1: h1 as u8,
            dig_h2: h2 as i16,
            dig_h3: h3 as u8,
            dig_h4,
            dig_h5,
            dig_h6: h6 as i8,
        })
    }
}

/// 拼接半字节交错存放的dig_H4和dig_H5
///
/// - dig_H4 = e4 << 4 | (e5 & 0x0F)
/// - dig_H5 = e6 << 4 | (e5 >> 4)
///
/// e4、e6按有符号字节参与运算。
fn reconstruct_h4_h5(e4: i32, e5: i32, e6: i32) -> (i16, i16) {
    let dig_h4 = (e4 << 4) | (e5 & 0x0F);
    let dig_h5 = (e6 << 4) | (e5 >> 4);
    (dig_h4 as i16, dig_h5 as i16)
}

fn check_len(register: u8, block: &[u8], expected: usize) -> Result<(), Error> {
    if block.len() < expected {
        return Err(Error::CalibrationRead {
            register,
            reason: format!("期望{}字节, 实际{}字节", expected, block.len()),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 数据手册示例中的校准系数，湿度部分 H1=75 H2=370 H3=0 H4=313 H5=50 H6=30
    const DATASHEET_CALIB_00: [u8; 26] = [
        0x70, 0x6B, 0x43, 0x67, 0x18, 0xFC, 0x7D, 0x8E, 0x43, 0xD6, 0xD0, 0x0B, 0x27, 0x0B, 0x8C,
        0x00, 0xF9, 0xFF, 0x8C, 0x3C, 0xF8, 0xC6, 0x70, 0x17, 0x00, 0x4B,
    ];
    const DATASHEET_CALIB_26: [u8; 7] = [0x72, 0x01, 0x00, 0x13, 0x29, 0x03, 0x1E];

    #[test]
    fn parses_datasheet_blocks() {
        let calib = Calibration::parse(&DATASHEET_CALIB_00, &DATASHEET_CALIB_26).unwrap();
        assert_eq!(
            calib,
            Calibration {
                dig_t1: 27504,
                dig_t2: 26435,
                dig_t3: -1000,
                dig_p1: 36477,
                dig_p2: -10685,
                dig_p3: 3024,
                dig_p4: 2855,
                dig_p5: 140,
                dig_p6: -7,
                dig_p7: 15500,
                dig_p8: -14600,
                dig_p9: 6000,
                dig_h1: 75,
                dig_h2: 370,
                dig_h3: 0,
                dig_h4: 313,
                dig_h5: 50,
                dig_h6: 30,
            }
        );
    }

    #[test]
    fn h4_h5_nibble_reconstruction() {
        assert_eq!(reconstruct_h4_h5(0x12, 0x34, 0x56), (0x124, 0x563));

        let mut calib_26 = DATASHEET_CALIB_26;
        calib_26[3..6].copy_from_slice(&[0x12, 0x34, 0x56]);
        let calib = Calibration::parse(&DATASHEET_CALIB_00, &calib_26).unwrap();
        assert_eq!(calib.dig_h4, 0x124);
        assert_eq!(calib.dig_h5, 0x563);
    }

    #[test]
    fn h4_h5_keep_signed_12_bit_range() {
        assert_eq!(reconstruct_h4_h5(0xFF_u8 as i8 as i32, 0xFF, 0x80_u8 as i8 as i32), (-1, -2033));
    }

    #[test]
    fn high_bit_bytes_follow_register_types() {
        let mut calib_00 = DATASHEET_CALIB_00;
        calib_00[25] = 0xC8;
        let mut calib_26 = DATASHEET_CALIB_26;
        calib_26[3..6].copy_from_slice(&[0x80, 0x0F, 0x90]);
        let calib = Calibration::parse(&calib_00, &calib_26).unwrap();

        // dig_H1无符号
        assert_eq!(calib.dig_h1, 200);
        // e4、e6按有符号字节扩展
        assert_eq!(calib.dig_h4, -2033);
        assert_eq!(calib.dig_h5, -1792);
    }

    #[test]
    fn layout_matches_register_map() {
        // 各字段首尾相接，恰好覆盖整个数据块
        let mut next = 0;
        for field in CALIB_00_LAYOUT {
            assert_eq!(field.offset, next, "{}", field.name);
            next += field.width.size();
        }
        assert_eq!(next, CALIB_00_LEN);

        let mut next = 0;
        for field in CALIB_26_LAYOUT {
            assert_eq!(field.offset, next, "{}", field.name);
            next += field.width.size();
        }
        assert_eq!(next, CALIB_26_LEN);

        // dig_H1 位于0xA1
        assert_eq!(REG_CALIB_00 as usize + CALIB_00_LAYOUT[13].offset, 0xA1);
    }

    #[test]
    fn short_blocks_are_rejected() {
        assert!(matches!(
            Calibration::parse(&DATASHEET_CALIB_00[..25], &DATASHEET_CALIB_26),
            Err(Error::CalibrationRead { register: REG_CALIB_00, .. })
        ));
        assert!(matches!(
            Calibration::parse(&DATASHEET_CALIB_00, &DATASHEET_CALIB_26[..6]),
            Err(Error::CalibrationRead { register: REG_CALIB_26, .. })
        ));
    }
}
