//! BME280 定点补偿算法
//!
//! 按数据手册 4.2.3 节的整数补偿公式实现。运算顺序和移位位数都会影响
//! 截断结果，不能随意调整。
//!
//! 温度链使用64位有符号整型。压力和湿度链中，系数取到存储类型的极值时
//! 中间量会超过64位，因此使用128位整型；压力最后一步的平方项仍可能超出
//! 128位，按饱和运算处理，结果截到i64范围。

use super::calibration::Calibration;
use super::raw::RawSample;

/// 湿度补偿结果的上限: 100%RH 在 Q22.10 左移12位后的定点表示
pub const HUMIDITY_MAX: i64 = 419_430_400;

/// 温度补偿得到的高精度中间值 t_fine
///
/// 只在一次补偿过程内有效，由温度补偿产生后按值传给压力和湿度补偿。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FineTemperature(i64);

impl FineTemperature {
    pub fn value(self) -> i64 {
        self.0
    }
}

/// 补偿后的定点输出
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Compensated {
    /// 温度，单位 0.01°C
    pub temperature: i32,
    /// 压力，单位 Pa/256 (Q24.8)
    pub pressure: i64,
    /// 相对湿度，单位 %RH/1024 (Q22.10)
    pub humidity: u32,
}

/// 对一组原始数据完成温度、压力、湿度补偿
///
/// t_fine 在这里现算现用，不跨采样保存。
pub fn compensate(raw: &RawSample, calib: &Calibration) -> Compensated {
    let (temperature, t_fine) = compensate_temperature(raw.temperature, calib);
    Compensated {
        temperature,
        pressure: compensate_pressure(raw.pressure, t_fine, calib),
        humidity: compensate_humidity(raw.humidity, t_fine, calib),
    }
}

/// BME280温度补偿函数
///
/// 返回 0.01°C 为单位的温度和压力/湿度补偿需要的 t_fine
pub fn compensate_temperature(adc_t: u32, calib: &Calibration) -> (i32, FineTemperature) {
    let adc_t = adc_t as i64;
    let dig_t1 = calib.dig_t1 as i64;
    let dig_t2 = calib.dig_t2 as i64;
    let dig_t3 = calib.dig_t3 as i64;

    let var1 = (((adc_t >> 3) - (dig_t1 << 1)) * dig_t2) >> 11;
    let var2 = (((((adc_t >> 4) - dig_t1) * ((adc_t >> 4) - dig_t1)) >> 12) * dig_t3) >> 14;

    let t_fine = var1 + var2;
    let temperature = (t_fine * 5 + 128) >> 8;

    (temperature as i32, FineTemperature(t_fine))
}

/// BME280 压力补偿函数
///
/// 返回 Q24.8 格式的压力(Pa)，例如 24674867 表示 24674867/256 = 96386.2 Pa。
/// 中间量 var1 为0时返回0，表示校准数据无效或原始值饱和。
pub fn compensate_pressure(adc_p: u32, t_fine: FineTemperature, calib: &Calibration) -> i64 {
    let dig_p1 = calib.dig_p1 as i128;
    let dig_p2 = calib.dig_p2 as i128;
    let dig_p3 = calib.dig_p3 as i128;
    let dig_p4 = calib.dig_p4 as i128;
    let dig_p5 = calib.dig_p5 as i128;
    let dig_p6 = calib.dig_p6 as i128;
    let dig_p7 = calib.dig_p7 as i128;
    let dig_p8 = calib.dig_p8 as i128;
    let dig_p9 = calib.dig_p9 as i128;

    // 步骤1: 温度相关变量
    let mut var1 = t_fine.value() as i128 - 128000;

    // 步骤2: 二阶补偿项
    let mut var2 = var1 * var1 * dig_p6;
    var2 += (var1 * dig_p5) << 17;
    var2 += dig_p4 << 35;

    // 步骤3: 主补偿项
    var1 = ((var1 * var1 * dig_p3) >> 8) + ((var1 * dig_p2) << 12);
    var1 = (((1_i128 << 47) + var1) * dig_p1) >> 33;

    // 步骤4: 除数为0
    if var1 == 0 {
        return 0;
    }

    // 步骤5: 初步压力值(整数除法向零截断)
    let mut p = 1048576 - adc_p as i128;
    p = (((p << 31) - var2) * 3125) / var1;

    // 步骤6: 最终修正
    let q = p >> 13;
    var1 = dig_p9.saturating_mul(q).saturating_mul(q) >> 25;
    var2 = (dig_p8 * p) >> 19;
    let p = (p.saturating_add(var1).saturating_add(var2) >> 8) + (dig_p7 << 4);

    p.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}

/// BME280 湿度补偿函数
///
/// 返回 Q22.10 格式的相对湿度，例如 47445 表示 47445/1024 = 46.333 %RH
pub fn compensate_humidity(adc_h: u32, t_fine: FineTemperature, calib: &Calibration) -> u32 {
    let adc_h = adc_h as i128;
    let dig_h1 = calib.dig_h1 as i128;
    let dig_h2 = calib.dig_h2 as i128;
    let dig_h3 = calib.dig_h3 as i128;
    let dig_h4 = calib.dig_h4 as i128;
    let dig_h5 = calib.dig_h5 as i128;
    let dig_h6 = calib.dig_h6 as i128;

    let var1 = t_fine.value() as i128 - 76800;

    let var2 = (((adc_h << 14) - (dig_h4 << 20) - (dig_h5 * var1)) + 16384) >> 15;
    let var3 = (((var1 * dig_h6) >> 10) * (((var1 * dig_h3) >> 11) + 32768)) >> 10;
    let var4 = ((var3 + 2097152) * dig_h2 + 8192) >> 14;
    let mut h = var2 * var4;

    // 非线性修正
    h -= ((((h >> 15) * (h >> 15)) >> 7) * dig_h1) >> 4;

    (h.clamp(0, HUMIDITY_MAX as i128) >> 12) as u32
}
