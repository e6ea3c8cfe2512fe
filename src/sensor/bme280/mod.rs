use std::{thread, time::Duration};

use log::debug;

use crate::i2c_bus_wapper::BusPort;

pub mod calibration;
pub mod compensation;
pub mod error;
pub mod raw;
pub mod units;

pub use calibration::Calibration;
pub use compensation::{Compensated, FineTemperature};
pub use error::Error;
pub use raw::RawSample;
pub use units::{PhysicalReading, SEA_LEVEL_PRESSURE};

/// BME280的两个出厂I2C地址(SDO接地为0x76，接VDDIO为0x77)
pub const BME280_ADDRESSES: [u8; 2] = [0x76, 0x77];
/// BME280芯片ID
pub const CHIP_ID: u8 = 0x60;

// 寄存器地址
const REG_ID: u8 = 0xD0;
const REG_RESET: u8 = 0xE0;
const REG_CTRL_HUM: u8 = 0xF2;
const REG_STATUS: u8 = 0xF3;
const REG_CTRL_MEAS: u8 = 0xF4;
const REG_CONFIG: u8 = 0xF5;

/// 软复位命令
const SOFT_RESET_CMD: u8 = 0xB6;
/// ctrl_meas[1:0] 正常模式
const MODE_NORMAL: u8 = 0b11;

/// 过采样倍数，温度、压力、湿度共用同一个设置
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Sampling {
    #[default]
    X1 = 1,
    X2 = 2,
    X4 = 3,
    X8 = 4,
    X16 = 5,
}

impl Sampling {
    /// 寄存器中的编码
    pub fn code(self) -> u8 {
        self as u8
    }

    /// 由寄存器编码(1~5)构建
    pub fn from_code(code: u8) -> Result<Self, Error> {
        match code {
            1 => Ok(Self::X1),
            2 => Ok(Self::X2),
            3 => Ok(Self::X4),
            4 => Ok(Self::X8),
            5 => Ok(Self::X16),
            _ => Err(Error::InvalidSampling(code)),
        }
    }
}

/// 正常模式下两次测量之间的待机时间 (config[7:5])
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Standby {
    #[default]
    Ms0_5 = 0,
    Ms62_5 = 1,
    Ms125 = 2,
    Ms250 = 3,
    Ms500 = 4,
    Ms1000 = 5,
    Ms10 = 6,
    Ms20 = 7,
}

/// IIR滤波系数 (config[4:2])
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    #[default]
    Off = 0,
    X2 = 1,
    X4 = 2,
    X8 = 3,
    X16 = 4,
}

/// 打开传感器时的选项
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// 从设备地址，为空时扫描总线自动识别
    pub address: Option<u8>,
    /// 过采样倍数
    pub sampling: Sampling,
    /// 输出调试日志
    pub debug: bool,
}

impl Options {
    pub fn with_address(mut self, address: u8) -> Self {
        self.address = Some(address);
        self
    }

    pub fn with_sampling(mut self, sampling: Sampling) -> Self {
        self.sampling = sampling;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

/// BME280状态寄存器 (0xF3)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status {
    /// 第3位: 正在进行转换
    pub measuring: bool,
    /// 第0位: 正在把NVM数据复制到影像寄存器
    pub im_update: bool,
}

/// 解析状态
impl From<u8> for Status {
    fn from(data: u8) -> Self {
        Self {
            measuring: (data & 0b0000_1000) != 0,
            im_update: (data & 0b0000_0001) != 0,
        }
    }
}

/// BME280 大气压力、温度、湿度传感器封装对象
///
/// 所有总线操作都需要`&mut self`，同一个实例不能被并发访问；
/// 需要跨线程共享时由调用方加锁。
pub struct BME280<B: BusPort> {
    /// 总线端口
    bus: B,
    /// I2C从设备地址
    address: u8,
    /// 校准参数，打开时读取一次
    calib: Calibration,
    /// 过采样倍数
    sampling: Sampling,
    /// 计算高度用的参考气压 (hPa)
    reference_pressure: f64,
    /// 是否输出调试日志
    debug: bool,
}

/// 实现BME280传感器操作
impl<B: BusPort> BME280<B> {
    /// 打开传感器
    ///
    /// 未指定地址时扫描总线，只有恰好一个出厂地址应答才会成功。
    /// 随后读取校准数据，并写入过采样设置、进入正常模式。
    pub fn open(mut bus: B, options: Options) -> Result<Self, Error> {
        // 确定从设备地址
        let address = match options.address {
            Some(address) => address,
            None => {
                let address = Self::discover(&mut bus)?;
                if options.debug {
                    debug!("BME280: 在地址0x{:02X}上发现设备", address);
                }
                address
            }
        };

        // 读取校准数据
        let calib = Calibration::read(&mut bus, address)?;
        if options.debug {
            debug!("BME280: 校准数据 {:?}", calib);
        }

        // 构建传感器实例
        let mut sensor = Self {
            bus,
            address,
            calib,
            sampling: options.sampling,
            reference_pressure: SEA_LEVEL_PRESSURE,
            debug: options.debug,
        };

        // 先配置湿度采样率，写ctrl_meas后才生效
        let mode = sensor.sampling.code();
        sensor.write(REG_CTRL_HUM, mode)?;

        // 配置温度、压力采样率和正常模式
        sensor.write(REG_CTRL_MEAS, (mode << 5) | (mode << 2) | MODE_NORMAL)?;
        if sensor.debug {
            debug!("BME280: 过采样{:?}, 正常模式", sensor.sampling);
        }

        // OK
        Ok(sensor)
    }

    /// 扫描总线，按出厂地址顺序比对
    fn discover(bus: &mut B) -> Result<u8, Error> {
        // 扫描不针对具体寄存器，寄存器号记为0
        let found = bus.scan().map_err(|err| Error::BusRead {
            register: 0,
            reason: format!("总线扫描失败: {:?}", err),
        })?;
        let candidates: Vec<u8> = BME280_ADDRESSES
            .iter()
            .copied()
            .filter(|address| found.contains(address))
            .collect();

        match candidates.as_slice() {
            [] => Err(Error::NoDeviceFound),
            [address] => Ok(*address),
            [first, second, ..] => Err(Error::AmbiguousDevice(*first, *second)),
        }
    }

    fn write(&mut self, register: u8, value: u8) -> Result<(), Error> {
        self.bus
            .write_register(self.address, register, &[value])
            .map_err(|err| Error::bus_write(register, err))
    }

    fn read(&mut self, register: u8) -> Result<u8, Error> {
        let data = self
            .bus
            .read_register(self.address, register, 1)
            .map_err(|err| Error::bus_read(register, err))?;
        data.first()
            .copied()
            .ok_or_else(|| Error::short_read(register, 1, 0))
    }

    /// 读取原始ADC值
    pub fn read_raw(&mut self) -> Result<RawSample, Error> {
        RawSample::read(&mut self.bus, self.address)
    }

    /// 读取并补偿，返回定点结果
    pub fn read_compensated(&mut self) -> Result<Compensated, Error> {
        let raw = self.read_raw()?;
        Ok(compensation::compensate(&raw, &self.calib))
    }

    /// 读取补偿后的传感器数据
    ///
    /// - 返回（温度【℃】，气压【hPa】，湿度【%RH】，高度【m】）
    pub fn sample(&mut self) -> Result<PhysicalReading, Error> {
        let compensated = self.read_compensated()?;
        Ok(units::convert(&compensated, self.reference_pressure))
    }

    /// 以当前气压作为参考气压，此后高度相对当前位置计算
    pub fn calibrate_to_current_altitude(&mut self) -> Result<(), Error> {
        let compensated = self.read_compensated()?;
        self.reference_pressure = units::pressure_hpa(compensated.pressure) as f64;
        if self.debug {
            debug!("BME280: 参考气压设置为{}hPa", self.reference_pressure);
        }
        Ok(())
    }

    /// 是否已经确定从设备地址
    ///
    /// `open`在确定地址之前不会返回会话，所以已构建的会话总是就绪。
    pub fn is_ready(&self) -> bool {
        true
    }

    /// 从设备地址
    pub fn address(&self) -> u8 {
        self.address
    }

    /// 校准参数
    pub fn calibration(&self) -> &Calibration {
        &self.calib
    }

    /// 过采样倍数
    pub fn sampling(&self) -> Sampling {
        self.sampling
    }

    /// 参考气压 (hPa)
    pub fn reference_pressure(&self) -> f64 {
        self.reference_pressure
    }

    /// 手动设置参考气压 (hPa)，例如当地气象站公布的海平面气压
    pub fn set_reference_pressure(&mut self, hpa: f64) {
        self.reference_pressure = hpa;
    }

    /// 读取芯片ID，BME280为0x60
    pub fn chip_id(&mut self) -> Result<u8, Error> {
        self.read(REG_ID)
    }

    /// 读取状态寄存器
    pub fn status(&mut self) -> Result<Status, Error> {
        Ok(Status::from(self.read(REG_STATUS)?))
    }

    /// 配置待机时间和IIR滤波
    ///
    /// 正常模式下写config可能被忽略，数据手册建议在休眠模式下写入。
    pub fn set_config(&mut self, standby: Standby, filter: Filter) -> Result<(), Error> {
        self.write(REG_CONFIG, ((standby as u8) << 5) | ((filter as u8) << 2))
    }

    /// 软复位传感器
    ///
    /// 复位后重新打开会话(重新读取校准数据)，参考气压保持不变。
    pub fn reset(mut self) -> Result<Self, Error> {
        self.write(REG_RESET, SOFT_RESET_CMD)?;

        // 等待复位完成
        thread::sleep(Duration::from_millis(5));

        let reference_pressure = self.reference_pressure;
        let options = Options {
            address: Some(self.address),
            sampling: self.sampling,
            debug: self.debug,
        };
        let mut sensor = Self::open(self.bus, options)?;
        sensor.reference_pressure = reference_pressure;

        // OK
        Ok(sensor)
    }

    /// 释放总线端口
    pub fn release(self) -> B {
        self.bus
    }
}
