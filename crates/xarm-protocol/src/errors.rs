//! 设备错误/警告码表与分类
//!
//! 控制盒在状态字节的 bit 5–6 标记警告/错误；随后通过 GetError
//! 查询得到 `{error_code, warning_code}`。错误码在两张固定表中查找，
//! 表外的码归为"未识别"——绝不静默忽略。

/// 过流碰撞错误码：必须由操作员手动清除，驱动不得自动重试
pub const COLLISION_ERROR_CODE: u8 = 0x1F;

/// 控制盒错误码表
pub fn controller_error(code: u8) -> Option<&'static str> {
    Some(match code {
        0x01 => "xArm: Emergency Stop Button Pushed In",
        0x02 => "xArm: Emergency IO Triggered",
        0x03 => "xArm: Emergency Stop 3-State Switch Pressed",
        0x0B..=0x11 => "xArm: Power Cycle Required",
        0x13 => "xArm: Gripper Communication Error",
        0x15 => "xArm: Kinematic Error",
        0x16 => "xArm: Self Collision Error",
        0x17 => "xArm: Joint Angle Exceeds Limit",
        0x18 => "xArm: Speed Exceeds Limit",
        0x19 => "xArm: Planning Error",
        0x1A => "xArm: Linux RT Error",
        0x1B => "xArm: Command Reply Error",
        0x1C => "xArm: End Module Communication Error",
        0x1D => "xArm: Other Errors",
        0x1E => "xArm: Feedback Speed Exceeds Limit",
        COLLISION_ERROR_CODE => "xArm: Collision Caused Abnormal Current",
        0x20 => "xArm: Three-point Drawing Circle Calculation Error",
        0x21 => "xArm: Abnormal Arm Current",
        0x22 => "xArm: Recording Timeout",
        0x23 => "xArm: Safety Boundary Limit",
        0x24 => "xArm: Delay Command Limit Exceeded",
        0x25 => "xArm: Abnormal Motion in Manual Mode",
        0x26 => "xArm: Abnormal Joint Angle",
        0x27 => "xArm: Abnormal Communication Between Power Boards",
        _ => return None,
    })
}

/// 控制盒警告码表
pub fn controller_warning(code: u8) -> Option<&'static str> {
    Some(match code {
        0x0B => "xArm Warning: Buffer Overflow",
        0x0C => "xArm Warning: Command Parameter Abnormal",
        0x0D => "xArm Warning: Unknown Command",
        0x0E => "xArm Warning: Command No Solution",
        _ => return None,
    })
}

/// 逐伺服错误码表
pub fn servo_error(code: u8) -> Option<&'static str> {
    Some(match code {
        0x00 => "xArm Servo: Joint Communication Error",
        0x0A => "xArm Servo: Current Detection Error",
        0x0B => "xArm Servo: Joint Overcurrent",
        0x0C => "xArm Servo: Joint Overspeed",
        0x0E => "xArm Servo: Position Command Overlimit",
        0x0F => "xArm Servo: Joints Overheat",
        0x10 => "xArm Servo: Encoder Initialization Error",
        0x11 => "xArm Servo: Single-turn Encoder Error",
        0x12 => "xArm Servo: Multi-turn Encoder Error",
        0x13 => "xArm Servo: Low Battery Voltage",
        0x14 => "xArm Servo: Driver IC Hardware Error",
        0x15 => "xArm Servo: Driver IC Init Error",
        0x16 => "xArm Servo: Encoder Config Error",
        0x17 => "xArm Servo: Large Motor Position Deviation",
        0x1A => "xArm Servo: Joint N Positive Overrun",
        0x1B => "xArm Servo: Joint N Negative Overrun",
        0x1C => "xArm Servo: Joint Commands Error",
        0x21 => "xArm Servo: Drive Overloaded",
        0x22 => "xArm Servo: Motor Overload",
        0x23 => "xArm Servo: Motor Type Error",
        0x24 => "xArm Servo: Driver Type Error",
        0x27 => "xArm Servo: Joint Overvoltage",
        0x28 => "xArm Servo: Joint Undervoltage",
        0x31 => "xArm Servo: EEPROM RW Error",
        0x34 => "xArm Servo: Initialization of Motor Angle Error",
        _ => return None,
    })
}

/// GetError 查询结果：`[state, error_code, warning_code]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorReport {
    /// 查询响应里的状态字节
    pub state: u8,
    pub error_code: u8,
    pub warn_code: u8,
}

impl ErrorReport {
    /// 从 GetError 响应 params 解析
    pub fn parse(params: &[u8]) -> Result<Self, crate::ProtocolError> {
        if params.len() < 3 {
            return Err(crate::ProtocolError::UnexpectedParams {
                what: "error report",
                expected: 3,
                actual: params.len(),
            });
        }
        Ok(Self {
            state: params[0],
            error_code: params[1],
            warn_code: params[2],
        })
    }
}

/// 设备故障分类
///
/// - `Fatal`: 过流碰撞，必须人工清除，不得自动重试
/// - `Recoverable`: 码表内的其他错误/警告，驱动自动清除并复位运动
///   子系统后仍向调用方上抛（触发它的命令并未完成）
/// - `Unknown`: 两张表都查不到的码，必须上抛，绝不假定无害
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceFault {
    Fatal(&'static str),
    Recoverable {
        error: Option<&'static str>,
        warning: Option<&'static str>,
    },
    Unknown {
        error_code: u8,
        warn_code: u8,
    },
}

/// 把错误报告归类为故障类别
pub fn classify(report: &ErrorReport) -> DeviceFault {
    if report.error_code == COLLISION_ERROR_CODE {
        return DeviceFault::Fatal(
            controller_error(COLLISION_ERROR_CODE)
                .unwrap_or("xArm: Collision Caused Abnormal Current"),
        );
    }
    let error = controller_error(report.error_code);
    let warning = controller_warning(report.warn_code);
    if error.is_some() || warning.is_some() {
        DeviceFault::Recoverable { error, warning }
    } else {
        DeviceFault::Unknown {
            error_code: report.error_code,
            warn_code: report.warn_code,
        }
    }
}

/// 单个伺服的诊断结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServoFault {
    /// 伺服槽位（1 起，含夹爪通道）
    pub servo: usize,
    pub code: u8,
    pub message: &'static str,
}

/// 解析逐伺服错误查询响应
///
/// 查询覆盖全部 8 个槽位：xArm 6 有 6 关节、xArm 7 有 7 关节，
/// 外加夹爪通道。聚合所有命中，不短路。
pub fn parse_servo_faults(params: &[u8]) -> Result<Vec<ServoFault>, crate::ProtocolError> {
    if params.len() < 18 {
        return Err(crate::ProtocolError::UnexpectedParams {
            what: "servo error report",
            expected: 18,
            actual: params.len(),
        });
    }
    let mut faults = Vec::new();
    for servo in 1..9 {
        let code = params[servo * 2];
        if let Some(message) = servo_error(code) {
            faults.push(ServoFault {
                servo,
                code,
                message,
            });
        }
    }
    Ok(faults)
}
