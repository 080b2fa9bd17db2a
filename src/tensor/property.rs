/*
 * @Author       : 老董
 * @Date         : 2026-08-12
 * @Description  : 本文件仅包含张量的属性方法，不包含任何运算方法
 */

use super::Tensor;

impl Tensor {
    /// 张量的形状。若为矩阵，`shape`是[n, m]；标量可以是[]、[1]、[1,1]...
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// 张量的维（dim）数、阶（rank）数，即`shape()`的元素个数
    pub fn dimension(&self) -> usize {
        self.data.ndim()
    }

    /// 张量中所有元素的数量
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// 判断张量是否为标量
    pub fn is_scalar(&self) -> bool {
        self.shape().is_empty() || self.shape().iter().all(|x| *x == 1)
    }

    /// 转化为纯数（number）。若为标量，则返回Some(number)，否则返回None
    pub fn number(&self) -> Option<f32> {
        if self.is_scalar() {
            self.data.iter().next().copied()
        } else {
            None
        }
    }

    /// 以行优先顺序导出所有元素
    pub fn to_vec(&self) -> Vec<f32> {
        self.data.iter().copied().collect()
    }
}
