/*
 * @Author       : 老董
 * @Date         : 2026-08-12
 * @Description  : 张量的索引与少量运算（逐元素加、矩阵乘、转置）
 */

use super::Tensor;
use ndarray::{Ix2, IxDyn};
use std::ops::{Add, AddAssign, Index, IndexMut};

impl Index<[usize; 2]> for Tensor {
    type Output = f32;

    fn index(&self, index: [usize; 2]) -> &Self::Output {
        &self.data[IxDyn(&index)]
    }
}

impl IndexMut<[usize; 2]> for Tensor {
    fn index_mut(&mut self, index: [usize; 2]) -> &mut Self::Output {
        &mut self.data[IxDyn(&index)]
    }
}

impl Add<&Tensor> for &Tensor {
    type Output = Tensor;

    fn add(self, rhs: &Tensor) -> Tensor {
        assert_eq!(
            self.shape(),
            rhs.shape(),
            "张量相加要求形状一致：{:?} vs {:?}",
            self.shape(),
            rhs.shape()
        );
        Tensor {
            data: &self.data + &rhs.data,
        }
    }
}

impl AddAssign<&Tensor> for Tensor {
    fn add_assign(&mut self, rhs: &Tensor) {
        assert_eq!(
            self.shape(),
            rhs.shape(),
            "张量自相加要求形状一致：{:?} vs {:?}",
            self.shape(),
            rhs.shape()
        );
        self.data += &rhs.data;
    }
}

impl Tensor {
    /// 矩阵乘法。要求两个张量均为2阶，且自身列数等于`other`的行数。
    ///
    /// # Panics
    /// 形状不兼容时panic（图层在调用前已做过校验）。
    pub fn mat_mul(&self, other: &Self) -> Self {
        let a = self
            .data
            .view()
            .into_dimensionality::<Ix2>()
            .expect("mat_mul要求2阶张量");
        let b = other
            .data
            .view()
            .into_dimensionality::<Ix2>()
            .expect("mat_mul要求2阶张量");
        Self {
            data: a.dot(&b).into_dyn(),
        }
    }

    /// 2阶张量的转置
    pub fn transpose(&self) -> Self {
        let a = self
            .data
            .view()
            .into_dimensionality::<Ix2>()
            .expect("transpose要求2阶张量");
        Self {
            data: a.t().to_owned().into_dyn(),
        }
    }
}
