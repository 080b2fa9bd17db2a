/*
 * @Author       : 老董
 * @Date         : 2026-08-12
 * @Description  : Input 节点：值由外部数据源逐小批量填充，不参与梯度存储
 */

use super::{GraphError, NodeHandle, TraitNode};
use crate::tensor::Tensor;

/// 输入节点。每个小批量由数据源通过 `set_value` 填充，列数可随批量变化，
/// 但行维（特征维）固定。输入节点不存储梯度——这正是诊断模式需要恒等探针的原因。
#[derive(Clone)]
pub(in crate::nn) struct Input {
    name: Option<String>,
    value: Option<Tensor>,
    row_dim: usize,
}

impl Input {
    pub(in crate::nn) fn new(row_dim: usize) -> Result<Self, GraphError> {
        if row_dim == 0 {
            return Err(GraphError::InvalidOperation(
                "Input节点的行维必须大于0".to_string(),
            ));
        }
        Ok(Self {
            name: None,
            value: None,
            row_dim,
        })
    }
}

impl TraitNode for Input {
    fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("<未命名>")
    }

    fn set_name(&mut self, name: &str) {
        self.name = Some(name.to_string());
    }

    fn calc_value_by_parents(&mut self, _parents: &[NodeHandle]) -> Result<(), GraphError> {
        Err(GraphError::InvalidOperation(format!(
            "Input节点'{}'的值应通过set_value设置，而非通过父节点前向传播计算",
            self.name()
        )))
    }

    fn value(&self) -> Option<&Tensor> {
        self.value.as_ref()
    }

    fn set_value(&mut self, value: Option<&Tensor>) -> Result<(), GraphError> {
        if let Some(v) = value {
            if v.dimension() != 2 || v.shape()[0] != self.row_dim {
                return Err(GraphError::ShapeMismatch {
                    expected: vec![self.row_dim, 0],
                    got: v.shape().to_vec(),
                    message: format!("Input节点'{}'要求行维为{}的2阶张量", self.name(), self.row_dim),
                });
            }
        }
        self.value = value.cloned();
        Ok(())
    }

    fn clear_value(&mut self) -> Result<(), GraphError> {
        self.value = None;
        Ok(())
    }

    fn calc_grad_to_parent(
        &self,
        _target_parent: &NodeHandle,
        _upstream_grad: &Tensor,
        _assistant_parent: Option<&NodeHandle>,
    ) -> Result<Tensor, GraphError> {
        Err(GraphError::InvalidOperation(
            "Input节点没有父节点，不应参与梯度计算".to_string(),
        ))
    }

    fn grad(&self) -> Option<&Tensor> {
        None
    }

    fn set_grad(&mut self, grad: Option<&Tensor>) -> Result<(), GraphError> {
        if grad.is_some() {
            return Err(GraphError::InvalidOperation(format!(
                "Input节点'{}'不应该有梯度",
                self.name()
            )));
        }
        Ok(())
    }
}
