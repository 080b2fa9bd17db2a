/*
 * @Author       : 老董
 * @Date         : 2026-08-12
 * @Description  : 极简张量类型：评估引擎只需要 f32 稠密张量的构造、索引与少量运算
 */

use ndarray::{Array, IxDyn};
use rand::distributions::{Distribution, Uniform};

mod ops;
mod property;


/// 定义张量的结构体。其可以是标量、向量、矩阵或更高维度的数组。
/// 注：只要通过Tensor初始化的都是张量（即使标量也是张量）；
/// 而通常意义上的数字（类型为usize、f32等）只是纯数（number），在这里不被认为是张量。
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    data: Array<f32, IxDyn>,
}

impl Tensor {
    /// 创建一个张量。`data`的长度必须和`shape`中所有元素的乘积相等。
    ///
    /// # Panics
    /// 若`data`长度与`shape`乘积不一致则panic。
    pub fn new(data: &[f32], shape: &[usize]) -> Self {
        let data = Array::from_shape_vec(IxDyn(shape), data.to_vec())
            .expect("Tensor::new: data长度与shape不一致");
        Self { data }
    }

    /// 创建一个全零张量
    pub fn zeros(shape: &[usize]) -> Self {
        Self {
            data: Array::zeros(IxDyn(shape)),
        }
    }

    /// 创建一个全一张量
    pub fn ones(shape: &[usize]) -> Self {
        Self {
            data: Array::ones(IxDyn(shape)),
        }
    }

    /// 创建一个随机张量，其值在[min, max]的闭区间内均匀分布
    pub fn new_random(min: f32, max: f32, shape: &[usize]) -> Self {
        let mut rng = rand::thread_rng();
        let uniform = Uniform::from(min..=max);
        let data = (0..shape.iter().product::<usize>())
            .map(|_| uniform.sample(&mut rng))
            .collect::<Vec<_>>();
        Self::new(&data, shape)
    }
}
