use super::compensation::Compensated;

/// 标准海平面气压 (hPa)
pub const SEA_LEVEL_PRESSURE: f64 = 1013.25;

/// 气压高度公式的比例常数 (m)
const ALTITUDE_SCALE: f64 = 44250.0;
/// 气压高度公式的指数
const ALTITUDE_EXPONENT: f64 = 0.189036;

/// 换算为常用单位后的读数
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct PhysicalReading {
    /// 温度 (°C)，保留1位小数
    pub temperature: f32,
    /// 气压 (hPa)，截断取整
    pub pressure: i32,
    /// 相对湿度 (%)，截断取整
    pub humidity: i32,
    /// 相对参考气压的高度 (m)，截断取整
    pub altitude: i32,
}

/// 把补偿结果换算为常用单位
pub fn convert(compensated: &Compensated, reference_hpa: f64) -> PhysicalReading {
    let pressure = pressure_hpa(compensated.pressure);
    PhysicalReading {
        temperature: temperature_celsius(compensated.temperature),
        pressure,
        humidity: humidity_percent(compensated.humidity),
        altitude: altitude(pressure, reference_hpa),
    }
}

/// 0.01°C -> °C，在0.1°C位上四舍五入(远离零)
pub fn temperature_celsius(centi_celsius: i32) -> f32 {
    let tenths = if centi_celsius >= 0 {
        (centi_celsius + 5) / 10
    } else {
        (centi_celsius - 5) / 10
    };
    tenths as f32 / 10.0
}

/// Q24.8 Pa -> hPa
pub fn pressure_hpa(pressure: i64) -> i32 {
    ((pressure >> 8) / 100) as i32
}

/// Q22.10 %RH -> %RH
pub fn humidity_percent(humidity: u32) -> i32 {
    (humidity >> 10) as i32
}

/// 由气压和参考气压推算高度
pub fn altitude(pressure_hpa: i32, reference_hpa: f64) -> i32 {
    let ratio = pressure_hpa as f64 / reference_hpa;
    (ALTITUDE_SCALE * (1.0 - ratio.powf(ALTITUDE_EXPONENT))) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temperature_rounds_half_away_from_zero() {
        assert_eq!(temperature_celsius(2508), 25.1);
        assert_eq!(temperature_celsius(2504), 25.0);
        assert_eq!(temperature_celsius(2505), 25.1);
        assert_eq!(temperature_celsius(-1264), -12.6);
        assert_eq!(temperature_celsius(-1265), -12.7);
        assert_eq!(temperature_celsius(0), 0.0);
    }

    #[test]
    fn pressure_and_humidity_truncate() {
        assert_eq!(pressure_hpa(25767233), 1006);
        assert_eq!(pressure_hpa(0), 0);
        assert_eq!(humidity_percent(57552), 56);
        assert_eq!(humidity_percent(102400), 100);
    }

    #[test]
    fn altitude_is_zero_at_reference() {
        assert_eq!(altitude(1013, 1013.0), 0);
        // 1013 hPa 相对 1013.25 hPa 只有约 2m
        assert!(altitude(1013, SEA_LEVEL_PRESSURE).abs() <= 2);
    }

    #[test]
    fn altitude_grows_as_pressure_drops() {
        assert_eq!(altitude(1006, SEA_LEVEL_PRESSURE), 60);
        assert!(altitude(900, SEA_LEVEL_PRESSURE) > altitude(1006, SEA_LEVEL_PRESSURE));
        assert!(altitude(1030, SEA_LEVEL_PRESSURE) < 0);
    }

    #[test]
    fn convert_golden_vector() {
        let reading = convert(
            &Compensated {
                temperature: 2508,
                pressure: 25767233,
                humidity: 57552,
            },
            SEA_LEVEL_PRESSURE,
        );
        assert_eq!(
            reading,
            PhysicalReading {
                temperature: 25.1,
                pressure: 1006,
                humidity: 56,
                altitude: 60,
            }
        );
    }
}
