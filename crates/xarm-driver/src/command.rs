//! 类型化命令面
//!
//! 驱动对外的辅助命令面是一个封闭的带标签变体集合：命令在边界处
//! 完成类型与取值域校验后才进入核心，不支持的命令在类型层面就
//! 不可表达——整体拒绝，不存在部分静默成功。

use crate::error::XArmError;
use crate::xarm::XArm;
use serde::Serialize;
use xarm_protocol::Register;

/// 辅助命令（关节运动走 [`XArm::move_through_joint_positions`] 等专用 API）
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// 夹爪初始化（使能 + 位置模式）
    SetupGripper,
    /// 夹爪移动到位置（有效范围 [-10, 850]，负值按 0 处理）
    MoveGripper { position: f64 },
    /// 读取夹爪位置
    GetGripperPosition,
    /// 读取逐关节负载
    Load,
    /// 设置速度上限（度/秒）
    SetSpeed { degs_per_sec: f64 },
    /// 设置加速度上限（度/秒²）
    SetAcceleration { degs_per_sec2: f64 },
    /// 设置碰撞灵敏度（0..=5）
    SetCollisionSensitivity { sensitivity: u8 },
    /// 真空吸盘吸取
    GrabVacuum,
    /// 真空吸盘释放
    OpenVacuum,
    /// 读取真空吸盘状态
    GetVacuumState,
    /// 清除错误与警告并复位运动子系统（碰撞急停后的人工清除入口）
    ClearError,
    /// 读取原始运动状态响应
    GetRawState,
    /// 读取原始错误报告
    GetRawError,
    /// Lite6 夹爪张开
    GripperLiteOpen,
    /// Lite6 夹爪闭合
    GripperLiteClose,
    /// Lite6 夹爪停止
    GripperLiteStop,
    /// Lite6 夹爪是否闭合
    GripperLiteIsClosed,
}

/// 命令的类型化响应
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum CommandResponse {
    /// 命令完成，无返回数据
    Done,
    GripperPosition(u32),
    Loads(Vec<f64>),
    VacuumState(bool),
    RawState(Vec<u8>),
    RawError { error_code: u8, warn_code: u8 },
    GripperLiteClosed(bool),
}

impl XArm {
    /// 执行一条辅助命令
    pub fn execute(&self, command: Command) -> Result<CommandResponse, XArmError> {
        match command {
            Command::SetupGripper => {
                self.setup_gripper()?;
                Ok(CommandResponse::Done)
            }
            Command::MoveGripper { position } => {
                if !position.is_finite() || !(-10.0..=850.0).contains(&position) {
                    return Err(XArmError::Validation(format!(
                        "must move gripper to a position between 0 and 850, got {position}"
                    )));
                }
                self.set_gripper_position(position.max(0.0) as u32)?;
                Ok(CommandResponse::Done)
            }
            Command::GetGripperPosition => {
                Ok(CommandResponse::GripperPosition(self.gripper_position()?))
            }
            Command::Load => Ok(CommandResponse::Loads(self.get_load()?)),
            Command::SetSpeed { degs_per_sec } => {
                self.set_speed(degs_per_sec)?;
                Ok(CommandResponse::Done)
            }
            Command::SetAcceleration { degs_per_sec2 } => {
                self.set_acceleration(degs_per_sec2)?;
                Ok(CommandResponse::Done)
            }
            Command::SetCollisionSensitivity { sensitivity } => {
                self.set_collision_sensitivity(sensitivity)?;
                Ok(CommandResponse::Done)
            }
            Command::GrabVacuum => {
                self.set_tool_channels(true, false)?;
                Ok(CommandResponse::Done)
            }
            Command::OpenVacuum => {
                self.set_tool_channels(false, true)?;
                Ok(CommandResponse::Done)
            }
            Command::GetVacuumState => Ok(CommandResponse::VacuumState(self.tool_channel_state()?)),
            Command::ClearError => {
                self.reset_error_state()?;
                Ok(CommandResponse::Done)
            }
            Command::GetRawState => {
                let resp = self.send(self.new_cmd(Register::GetState), false)?;
                Ok(CommandResponse::RawState(resp.params))
            }
            Command::GetRawError => {
                let report = self.error_report()?;
                Ok(CommandResponse::RawError {
                    error_code: report.error_code,
                    warn_code: report.warn_code,
                })
            }
            Command::GripperLiteOpen => {
                self.set_tool_channels(true, false)?;
                Ok(CommandResponse::Done)
            }
            Command::GripperLiteClose => {
                self.set_tool_channels(false, true)?;
                Ok(CommandResponse::Done)
            }
            Command::GripperLiteStop => {
                self.set_tool_channels(false, false)?;
                Ok(CommandResponse::Done)
            }
            Command::GripperLiteIsClosed => Ok(CommandResponse::GripperLiteClosed(
                self.tool_channel_state()?,
            )),
        }
    }
}
