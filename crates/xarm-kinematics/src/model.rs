//! 模型描述文件解析与参考实现

use crate::{Joints, KinematicModel, ModelError};
use serde::{Deserialize, Serialize};

/// 三维向量（平移/旋转轴通用）
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize)]
pub struct Vec3 {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

/// 碰撞几何（盒：x/y/z 边长；球：r 半径）
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GeometryDescriptor {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub z: f64,
    #[serde(default)]
    pub r: f64,
    #[serde(default)]
    pub translation: Option<Vec3>,
}

/// link 描述
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LinkDescriptor {
    pub id: String,
    pub parent: String,
    pub translation: Vec3,
    #[serde(default)]
    pub geometry: Option<GeometryDescriptor>,
}

/// joint 描述（角度限位单位为度）
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JointDescriptor {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub parent: String,
    pub axis: Vec3,
    pub min: f64,
    pub max: f64,
}

/// 模型描述文件
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModelDescriptor {
    pub name: String,
    pub links: Vec<LinkDescriptor>,
    pub joints: Vec<JointDescriptor>,
}

impl ModelDescriptor {
    /// 从 JSON 文本解析
    pub fn parse(json: &str) -> Result<Self, ModelError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// 单关节限位（弧度）
#[derive(Debug, Clone, PartialEq)]
pub struct JointLimit {
    pub id: String,
    pub min: f64,
    pub max: f64,
}

/// 锁定关节时限位收窄到的半带宽（弧度）
const LOCKED_JOINT_BAND: f64 = 1e-4;

/// 描述文件驱动的参考模型实现
///
/// 只实现驱动消费的接口：限位校验与线性构型插值。
/// link 几何与平移保留在描述中，供外部运动学组件使用。
#[derive(Debug, Clone)]
pub struct JointModel {
    name: String,
    limits: Vec<JointLimit>,
}

impl JointModel {
    /// 从模型描述构建
    pub fn from_descriptor(desc: &ModelDescriptor) -> Result<Self, ModelError> {
        let mut limits = Vec::with_capacity(desc.joints.len());
        for joint in &desc.joints {
            if joint.kind != "revolute" {
                return Err(ModelError::UnsupportedJointType {
                    joint: joint.id.clone(),
                    kind: joint.kind.clone(),
                });
            }
            limits.push(JointLimit {
                id: joint.id.clone(),
                min: joint.min.to_radians(),
                max: joint.max.to_radians(),
            });
        }
        Ok(Self {
            name: desc.name.clone(),
            limits,
        })
    }

    /// 从 JSON 文本构建
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        Self::from_descriptor(&ModelDescriptor::parse(json)?)
    }

    /// 内置 xArm6 模型
    pub fn xarm6() -> Result<Self, ModelError> {
        Self::from_json(include_str!("../models/xarm6.json"))
    }

    /// 内置 xArm7 模型
    pub fn xarm7() -> Result<Self, ModelError> {
        Self::from_json(include_str!("../models/xarm7.json"))
    }

    /// 内置 Lite6 模型
    pub fn lite6() -> Result<Self, ModelError> {
        Self::from_json(include_str!("../models/lite6.json"))
    }

    /// 按型号名构建内置模型
    pub fn for_model_name(name: &str) -> Result<Self, ModelError> {
        match name {
            "xArm6" => Self::xarm6(),
            "xArm7" => Self::xarm7(),
            "lite6" => Self::lite6(),
            other => Err(ModelError::UnknownModel(other.to_string())),
        }
    }

    /// 关节限位表
    pub fn limits(&self) -> &[JointLimit] {
        &self.limits
    }

    /// 把指定关节的限位收窄到实测角附近的窄带
    ///
    /// 用于表示"锁定/故障"关节：外部规划器在收窄后的模型上
    /// 规划时不会再移动该关节。
    pub fn with_locked_joint(mut self, index: usize, angle: f64) -> Result<Self, ModelError> {
        let limit = self
            .limits
            .get_mut(index)
            .ok_or(ModelError::UnknownJoint(index))?;
        limit.min = angle - LOCKED_JOINT_BAND;
        limit.max = angle + LOCKED_JOINT_BAND;
        Ok(self)
    }

    fn check_dof(&self, joints: &[f64]) -> Result<(), ModelError> {
        if joints.len() != self.limits.len() {
            return Err(ModelError::DofMismatch {
                model: self.name.clone(),
                expected: self.limits.len(),
                actual: joints.len(),
            });
        }
        Ok(())
    }
}

impl KinematicModel for JointModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn dof(&self) -> usize {
        self.limits.len()
    }

    fn check(&self, joints: &[f64]) -> Result<(), ModelError> {
        self.check_dof(joints)?;
        for (value, limit) in joints.iter().zip(&self.limits) {
            if *value < limit.min || *value > limit.max {
                return Err(ModelError::JointOutOfRange {
                    joint: limit.id.clone(),
                    value: *value,
                    min: limit.min,
                    max: limit.max,
                });
            }
        }
        Ok(())
    }

    fn interpolate(&self, from: &[f64], to: &[f64], amount: f64) -> Result<Joints, ModelError> {
        self.check(from)?;
        self.check(to)?;
        Ok(from
            .iter()
            .zip(to)
            .map(|(f, t)| f + (t - f) * amount)
            .collect())
    }
}
