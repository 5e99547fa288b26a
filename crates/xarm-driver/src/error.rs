//! 驱动层错误类型定义

use std::time::Duration;
use thiserror::Error;
use xarm_kinematics::ModelError;
use xarm_protocol::ProtocolError;

/// 驱动层错误类型
///
/// 分类与传播策略：
/// - `Transport`: 连接拒绝/重置/超时。连接随即失效，下一次调用透明重连。
/// - `Protocol`: 响应畸形/过短。不可重试，立即上抛。
/// - `DeviceFatal`: 碰撞过流。需要人工清除，驱动绝不自动重试。
/// - `DeviceRecoverable`: 其他已知错误/警告码。驱动已自动清除并复位
///   运动子系统，但触发它的命令没有完成，仍上抛给调用方。
/// - `DeviceUnknown`: 码表外的错误码。一律上抛，绝不吞掉。
/// - `Validation`: 配置/参数非法，在任何 I/O 之前拒绝。
/// - `GripperTimeout`: 夹爪收敛轮询超时，附带目标与耗时。
#[derive(Error, Debug)]
pub enum XArmError {
    /// 传输错误（连接失效，下一次调用重连）
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// 协议解析错误
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// 运动学模型错误
    #[error("kinematic model error: {0}")]
    Kinematics(#[from] ModelError),

    /// 碰撞过流急停，必须人工清除
    #[error(
        "collision caused overcurrent: ensure robot is clear of obstacles and clear error \
         through UFACTORY Studio or the clear_error command"
    )]
    DeviceFatal,

    /// 已知设备错误/警告（驱动已自动清除并复位运动状态）
    #[error("device fault: {description} (error cleared, motion state reset)")]
    DeviceRecoverable { description: String },

    /// 码表外的设备错误码
    #[error("unrecognized device fault: error 0x{error_code:02X}, warning 0x{warn_code:02X}")]
    DeviceUnknown { error_code: u8, warn_code: u8 },

    /// 配置或命令参数非法
    #[error("invalid configuration: {0}")]
    Validation(String),

    /// 夹爪收敛超时
    #[error("gripper move to {goal} timed out after {elapsed:?}")]
    GripperTimeout { goal: i64, elapsed: Duration },

    /// 运动操作被新操作取代或被 Stop/Close 终止
    #[error("operation cancelled")]
    Cancelled,

    /// 驱动已关闭，拒绝任何 I/O
    #[error("driver is closed")]
    Closed,
}
