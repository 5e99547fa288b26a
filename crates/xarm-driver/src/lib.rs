//! # xArm Driver
//!
//! UFACTORY xArm 机械臂驱动：持久 TCP 连接上的命令分帧与下发、
//! 设备/伺服错误态解码，以及把目标关节构型序列离散化为满足
//! 速度/加速度限制、按固定控制环频率执行的中间构型流。
//!
//! ## 模块
//!
//! - [`xarm`]: 驱动核心（命令发送、错误检查、运动操作）
//! - [`trajectory`]: 梯形速度曲线轨迹生成（纯函数）
//! - [`transport`]: TCP 传输（半双工序列化、按需重连、5s 期限）
//! - [`gripper`] / [`vacuum`]: 末端执行器控制器
//! - [`command`]: 类型化辅助命令面
//! - [`operation`]: 单运动操作管理
//! - [`profile`]: 运动 profile 快照（ArcSwap）
//!
//! ## 使用
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use xarm_driver::{XArm, XArmConfig};
//! use xarm_kinematics::JointModel;
//!
//! # fn main() -> Result<(), xarm_driver::XArmError> {
//! let model = Arc::new(JointModel::xarm6()?);
//! let arm = XArm::new(&XArmConfig::new("192.168.1.100"), model)?;
//!
//! let current = arm.current_joints()?;
//! let mut goal = current.clone();
//! goal[0] += 0.5;
//! arm.move_to_joint_positions(&goal)?;
//! arm.close()?;
//! # Ok(())
//! # }
//! ```

mod config;
pub mod command;
mod error;
pub mod gripper;
pub mod operation;
pub mod profile;
pub mod trajectory;
mod transport;
pub mod vacuum;
mod xarm;

pub use command::{Command, CommandResponse};
pub use config::XArmConfig;
pub use error::XArmError;
pub use gripper::{ConvergencePolicy, ConvergenceStatus, ConvergenceTracker, Gripper};
pub use operation::{OperationHandle, OperationManager};
pub use profile::{MotionProfile, MoveOptions};
pub use trajectory::create_raw_joint_steps;
pub use transport::REQUEST_DEADLINE;
pub use vacuum::{GripperLite, Vacuum};
pub use xarm::XArm;

// 下游常用的邻层类型
pub use xarm_kinematics::{JointModel, Joints, KinematicModel, ModelError};
pub use xarm_protocol::{ProtocolError, SAMPLE_RATE_HZ};
