//! 驱动配置

use crate::error::XArmError;
use crate::profile::{DEFAULT_ACCEL_DEGS_PER_SEC2, DEFAULT_SPEED_DEGS_PER_SEC, MotionProfile};
use serde::{Deserialize, Serialize};
use xarm_protocol::DEFAULT_PORT;

/// 驱动配置
///
/// 速度/加速度以度为单位（与设备手册一致），内部换算为弧度。
/// 缺省值：速度 50 °/s，加速度 500 °/s²，端口 502。
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct XArmConfig {
    /// 控制盒主机名或 IP（必填）
    pub host: String,

    /// 控制盒 TCP 端口
    #[serde(default = "default_port")]
    pub port: u16,

    /// 最大关节速度（度/秒）
    #[serde(default)]
    pub speed_degs_per_sec: Option<f64>,

    /// 最大关节加速度（度/秒²）
    #[serde(default)]
    pub acceleration_degs_per_sec_per_sec: Option<f64>,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl XArmConfig {
    /// 以默认端口和速度限制创建配置
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            speed_degs_per_sec: None,
            acceleration_degs_per_sec_per_sec: None,
        }
    }

    /// 校验配置；任何 I/O 之前调用
    pub fn validate(&self) -> Result<(), XArmError> {
        if self.host.is_empty() {
            return Err(XArmError::Validation("xArm host not set".to_string()));
        }
        if let Some(speed) = self.speed_degs_per_sec
            && speed <= 0.0
        {
            return Err(XArmError::Validation(format!(
                "given speed {speed} must be greater than zero"
            )));
        }
        if let Some(acceleration) = self.acceleration_degs_per_sec_per_sec
            && acceleration <= 0.0
        {
            return Err(XArmError::Validation(format!(
                "given acceleration {acceleration} must be greater than zero"
            )));
        }
        Ok(())
    }

    /// `host:port` 形式的拨号地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// 由配置生成初始运动 profile（缺省值补齐并换算为弧度）
    pub fn motion_profile(&self) -> MotionProfile {
        MotionProfile::from_degrees(
            self.speed_degs_per_sec.unwrap_or(DEFAULT_SPEED_DEGS_PER_SEC),
            self.acceleration_degs_per_sec_per_sec
                .unwrap_or(DEFAULT_ACCEL_DEGS_PER_SEC2),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_requires_host() {
        let config = XArmConfig::new("");
        assert!(matches!(
            config.validate(),
            Err(XArmError::Validation(msg)) if msg.contains("host")
        ));
    }

    #[test]
    fn test_validate_rejects_bad_speed() {
        let mut config = XArmConfig::new("192.168.1.100");
        config.speed_degs_per_sec = Some(-5.0);
        assert!(config.validate().is_err());

        config.speed_degs_per_sec = Some(30.0);
        config.acceleration_degs_per_sec_per_sec = Some(0.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_defaults() {
        let config = XArmConfig::new("10.0.0.2");
        assert!(config.validate().is_ok());
        assert_eq!(config.addr(), "10.0.0.2:502");

        let profile = config.motion_profile();
        assert!((profile.speed - 50f64.to_radians()).abs() < 1e-9);
        assert!((profile.acceleration - 500f64.to_radians()).abs() < 1e-9);
    }

    #[test]
    fn test_deserialize_from_json() {
        let config: XArmConfig = serde_json::from_str(
            r#"{"host": "192.168.1.100", "speed_degs_per_sec": 30}"#,
        )
        .unwrap();
        assert_eq!(config.port, 502);
        assert_eq!(config.speed_degs_per_sec, Some(30.0));
        assert!(config.acceleration_degs_per_sec_per_sec.is_none());
    }
}
