//! # xArm Kinematics
//!
//! 运动学模型接口层。
//!
//! 正反解、笛卡尔规划由外部运动学组件负责（见上层规划器）；
//! 驱动只依赖这里定义的窄接口：自由度、关节限位校验、构型插值。
//!
//! ## 模块
//!
//! - `model`: 模型描述文件（JSON）解析与参考实现 [`JointModel`]
//!
//! ## 模型文件
//!
//! 描述文件为 JSON 文档：有序的 links（id、parent、平移、可选碰撞
//! 几何）与 joints（id、type=revolute、父 link、旋转轴、角度上下限，
//! 单位为度）。内置 xArm6 / xArm7 / Lite6 三份描述。

pub mod model;

pub use model::{JointLimit, JointModel, ModelDescriptor};

use smallvec::SmallVec;
use thiserror::Error;

/// 关节构型：按关节序的弧度序列。
///
/// 栈上预留 7 个位置（设备家族最大自由度），100Hz 流式热路径上
/// 逐步生成时不触发堆分配。
pub type Joints = SmallVec<[f64; 7]>;

/// 运动学模型错误类型
#[derive(Error, Debug)]
pub enum ModelError {
    /// 模型描述文件解析失败
    #[error("model descriptor parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// 不支持的关节类型（当前只支持 revolute）
    #[error("unsupported joint type {kind:?} for joint {joint}")]
    UnsupportedJointType { joint: String, kind: String },

    /// 构型长度与模型自由度不符
    #[error("configuration has {actual} joints, model {model} expects {expected}")]
    DofMismatch {
        model: String,
        expected: usize,
        actual: usize,
    },

    /// 关节角超出限位
    #[error("joint {joint} value {value} rad outside limits [{min}, {max}]")]
    JointOutOfRange {
        joint: String,
        value: f64,
        min: f64,
        max: f64,
    },

    /// 锁定关节索引越界
    #[error("joint index {0} out of range")]
    UnknownJoint(usize),

    /// 未知的设备型号名
    #[error("no kinematics information for xarm of model {0:?}")]
    UnknownModel(String),
}

/// 运动学模型接口（外部协作者的接缝）
///
/// 驱动通过这个 trait 消费运动学能力；完整的运动学栈
/// （正反解、位姿求解）在外部实现同一接口即可接入。
pub trait KinematicModel: Send + Sync {
    /// 模型名（如 "xArm6"）
    fn name(&self) -> &str;

    /// 自由度
    fn dof(&self) -> usize;

    /// 校验构型长度与关节限位
    fn check(&self, joints: &[f64]) -> Result<(), ModelError>;

    /// 在两个构型之间按比例 `amount ∈ [0, 1]` 插值
    ///
    /// 两端构型都要通过限位校验；越限关节值立即报错，
    /// 不产生部分结果。
    fn interpolate(&self, from: &[f64], to: &[f64], amount: f64) -> Result<Joints, ModelError>;
}
