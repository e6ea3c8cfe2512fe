use std::fmt::Debug;

/// BME280驱动错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// 扫描总线未发现任何BME280
    NoDeviceFound,
    /// 两个出厂地址上都发现了BME280，必须显式指定地址
    AmbiguousDevice(u8, u8),
    /// 读取寄存器失败(传输错误或返回字节数不足)
    BusRead { register: u8, reason: String },
    /// 写入寄存器失败
    BusWrite { register: u8, reason: String },
    /// 校准参数读取失败或数据块长度不足
    CalibrationRead { register: u8, reason: String },
    /// 不支持的过采样编码(有效范围1~5)
    InvalidSampling(u8),
}

impl Error {
    pub(crate) fn bus_read(register: u8, err: impl Debug) -> Self {
        Self::BusRead {
            register,
            reason: format!("{:?}", err),
        }
    }

    pub(crate) fn bus_write(register: u8, err: impl Debug) -> Self {
        Self::BusWrite {
            register,
            reason: format!("{:?}", err),
        }
    }

    pub(crate) fn short_read(register: u8, expected: usize, actual: usize) -> Self {
        Self::BusRead {
            register,
            reason: format!("期望{}字节, 实际{}字节", expected, actual),
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoDeviceFound => write!(f, "未检测到BME280"),
            Self::AmbiguousDevice(first, second) => write!(
                f,
                "在0x{:02X}和0x{:02X}上都检测到BME280: 必须指定设备地址",
                first, second
            ),
            Self::BusRead { register, reason } => {
                write!(f, "读取寄存器0x{:02X}失败: {}", register, reason)
            }
            Self::BusWrite { register, reason } => {
                write!(f, "写入寄存器0x{:02X}失败: {}", register, reason)
            }
            Self::CalibrationRead { register, reason } => {
                write!(f, "读取校准数据0x{:02X}失败: {}", register, reason)
            }
            Self::InvalidSampling(code) => write!(f, "无效的过采样编码: {}", code),
        }
    }
}

impl std::error::Error for Error {}
