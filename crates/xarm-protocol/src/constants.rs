//! 协议常量定义

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// 协议 ID（帧头第二个 u16，固定值）
pub const PROTOCOL_ID: u16 = 2;

/// 控制盒默认 TCP 端口
pub const DEFAULT_PORT: u16 = 502;

/// 伺服流式运动的固定采样率（Hz）。设备家族常量，不要改。
pub const SAMPLE_RATE_HZ: f64 = 100.0;

/// 状态字节中错误位（bit 6）与警告位（bit 5）的掩码
pub const STATE_ERROR_WARNING_MASK: u8 = 1 << 6 | 1 << 5;

/// 控制盒刚重启/急停后的"未就绪"状态字节值，
/// 需要把运动状态重新置 0 才能继续运动
pub const STATE_NOT_READY: u8 = 0x10;

/// 状态字节是否指示有错误或警告（bit 5–6）
pub fn has_error_or_warning(state: u8) -> bool {
    state & STATE_ERROR_WARNING_MASK != 0
}

/// 运动状态
///
/// 有用的取值：
/// - 0: 伺服运动状态（可接收运动命令）
/// - 3: 暂停当前运动
/// - 4: 停止所有运动并重启系统
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum MotionState {
    Servo = 0,
    Suspend = 3,
    Stop = 4,
}

/// 运动模式
///
/// - 0: 位置控制模式（"普通"模式）
/// - 1: Servoj 模式。以最快可用速度立即执行关节位置，
///   用于向机械臂流式发送大量关节位置。
/// - 2: 关节示教模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum MotionMode {
    Position = 0,
    Servo = 1,
    Teach = 2,
}
