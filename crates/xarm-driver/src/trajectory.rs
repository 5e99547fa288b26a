//! 轨迹生成器：梯形速度曲线离散化
//!
//! 纯函数：(当前构型, 有序目标构型列表, 速度上限, 加速度上限,
//! 采样率) → 按采样间隔排布的中间构型序列。
//!
//! # 算法
//!
//! 梯形速度曲线作用在**整条**多路径点路径上，而不是逐段：
//! 速度只在起点缓升一次，在可能的情况下跨中间路径点巡航，
//! 只在终点缓降一次。
//!
//! 1. 逐段取"主导关节"位移（单段内走得最远的关节决定该段耗时），
//!    累计总位移和匀速步数估计。
//! 2. 由速度/加速度上限算出名义加速（=减速）采样数；若超过匀速
//!    估计的 95%（短程，达不到巡航速度），改由总位移和加速度上限
//!    反推一个更低的峰值速度，保证加减速对仍然装得下。
//! 3. **减速段**：从最终目标沿路径点列表*逆向*行走，速度从
//!    （概念上的）终点向上爬到峰值速度，由此确定纯减速覆盖的
//!    *尾部*路径点数。
//! 4. **加速段**：从起始构型正向穿过其余*头部*路径点，速度从
//!    近零爬到峰值（或在短程时与减速段汇合）。
//! 5. 两构型之间的插值交给运动学模型的构型插值能力，
//!    而不是裸线性插值，以尊重关节限位与模型语义。
//! 6. 拼接：正向加速步 + 逆向减速步的正序回放。到达巡航速度后，
//!    跨路径点继续推进改用更高的固定加速度常量，不再重新缓升。
//!
//! # 数值边界策略
//!
//! 位移比较使用 1e-6 epsilon，避免浮点残差导致死循环；
//! 剩余距离除以当前速度不足 1 个采样时按分数采样收尾，
//! 不会在路径点处过冲；全程零位移的退化输入产生空序列，不报错。

use crate::profile::{INTERWAYPOINT_ACCEL_DEGS_PER_SEC2, MotionProfile};
use xarm_kinematics::{Joints, KinematicModel, ModelError};

const EPSILON: f64 = 1e-6;

/// 主导关节位移：两构型间逐关节绝对差的最大值
fn max_joint_diff(from: &[f64], to: &[f64]) -> f64 {
    from.iter()
        .zip(to)
        .map(|(f, t)| (t - f).abs())
        .fold(0.0, f64::max)
}

/// 生成离散关节步序列
///
/// 提供的路径点不保证速度方向连续，位移度量必须逐段重新计算。
/// 插值失败（如越限关节值）立即上抛并中止生成。
pub fn create_raw_joint_steps(
    model: &dyn KinematicModel,
    start: &[f64],
    waypoints: &[Joints],
    profile: MotionProfile,
    sample_rate_hz: f64,
) -> Result<Vec<Joints>, ModelError> {
    let speed = profile.speed;
    let acceleration = profile.acceleration;
    let accel_step = acceleration / sample_rate_hz;
    let interwaypoint_accel_step =
        INTERWAYPOINT_ACCEL_DEGS_PER_SEC2.to_radians() / sample_rate_hz;

    // 预处理：逐段主导关节位移 → 总位移与匀速步数估计
    let mut step_total = 0.0;
    let mut displacement_total = 0.0;
    {
        let mut from: &[f64] = start;
        for to in waypoints {
            let max_diff = max_joint_diff(from, to);
            displacement_total += max_diff;
            step_total += (max_diff / speed) * sample_rate_hz;
            from = to;
        }
    }

    // 加速（同样也是减速）到速度上限需要的采样数；
    // 短程时反推降低后的峰值速度
    let mut nominal_accel_steps = ((speed / acceleration) * sample_rate_hz) as i64;
    if nominal_accel_steps as f64 > step_total * 0.95 {
        nominal_accel_steps =
            (0.95 * (displacement_total / acceleration).sqrt() * sample_rate_hz) as i64;
    }
    let max_vel = (nominal_accel_steps as f64 / sample_rate_hz) * acceleration;

    // 逆序路径：[wN, ..., w1, start]。首个转移（goal→goal）位移为零，
    // 保证减速段覆盖数 ≥ 1 时输出非空，加速段总有汇合点。
    let mut reversed: Vec<Joints> = waypoints.iter().rev().cloned().collect();
    reversed.push(Joints::from_slice(start));

    let (decel_covered, decel_steps) = match reversed.first() {
        Some(goal) => accel_curve(
            model,
            goal.clone(),
            &reversed,
            max_vel,
            speed,
            accel_step,
            interwaypoint_accel_step,
            sample_rate_hz,
        )?,
        None => return Ok(Vec::new()),
    };

    // 加速段只需要穿过未被减速段覆盖的头部路径点，
    // 终点替换为减速段走到的最深处
    let accel_stop = waypoints.len() as i64 - decel_covered as i64;
    let mut accel_path: Vec<Joints> = Vec::with_capacity(waypoints.len());
    for (i, waypoint) in waypoints.iter().enumerate() {
        if i as i64 == accel_stop {
            if let Some(deepest) = decel_steps.last() {
                accel_path.push(deepest.clone());
            }
            break;
        }
        accel_path.push(waypoint.clone());
    }

    let (_, mut steps) = accel_curve(
        model,
        Joints::from_slice(start),
        &accel_path,
        f64::INFINITY,
        speed,
        accel_step,
        interwaypoint_accel_step,
        sample_rate_hz,
    )?;

    // 减速步去掉最深的一个（已是加速段终点），正序回放
    if decel_steps.len() > 1 {
        for step in decel_steps[..decel_steps.len() - 1].iter().rev() {
            steps.push(step.clone());
        }
    }

    Ok(steps)
}

/// 沿路径行走并缓升速度，直到触及 `stop_vel` 或走完路径
///
/// 返回 (到达 `stop_vel` 时所在的路径点序号, 已生成的步序列)。
/// 走完全程未触及时序号为路径长度。
#[allow(clippy::too_many_arguments)]
fn accel_curve(
    model: &dyn KinematicModel,
    start: Joints,
    path: &[Joints],
    stop_vel: f64,
    speed: f64,
    base_accel_step: f64,
    interwaypoint_accel_step: f64,
    sample_rate_hz: f64,
) -> Result<(usize, Vec<Joints>), ModelError> {
    let mut accel_step = base_accel_step;
    let mut curr_speed = accel_step;
    let mut steps: Vec<Joints> = Vec::new();
    let mut from = start.clone();
    let mut last = start;

    for (i, to) in path.iter().enumerate() {
        let mut running_from = from.clone();
        loop {
            let curr_diff = max_joint_diff(&running_from, to);
            if curr_diff <= EPSILON {
                break;
            }
            if curr_speed <= 0.0 {
                break;
            }
            let n_steps = (curr_diff / curr_speed) * sample_rate_hz;
            let mut step_size = 1.0;
            if n_steps <= 1.0 {
                if curr_diff == 0.0 {
                    break;
                }
                // 不足一个采样：按分数采样收尾，正好落在路径点上
                step_size = n_steps;
            }
            let next = model.interpolate(&last, to, step_size / n_steps)?;
            running_from = next.clone();
            steps.push(next.clone());

            if curr_speed < speed {
                curr_speed += accel_step * step_size;
                if curr_speed > speed {
                    curr_speed = speed;
                }
            } else {
                // 已到巡航速度：其余路程用跨路径点加速度推进
                accel_step = interwaypoint_accel_step;
            }

            if curr_speed >= stop_vel - EPSILON {
                return Ok((i, steps));
            }

            last = next;
        }
        last = to.clone();
        from = to.clone();
    }
    Ok((path.len(), steps))
}
