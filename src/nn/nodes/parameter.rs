/*
 * @Author       : 老董
 * @Date         : 2026-08-12
 * @Description  : Parameter 节点：可学习参数，创建时随机初始化
 */

use super::{GraphError, NodeHandle, TraitNode};
use crate::tensor::Tensor;

#[derive(Clone)]
pub(in crate::nn) struct Parameter {
    name: Option<String>,
    value: Option<Tensor>,
    grad: Option<Tensor>,
}

impl Parameter {
    pub(in crate::nn) fn new(shape: &[usize]) -> Result<Self, GraphError> {
        if shape.len() != 2 {
            return Err(GraphError::InvalidOperation(format!(
                "Parameter节点要求2阶形状，得到{shape:?}"
            )));
        }
        Ok(Self {
            name: None,
            value: Some(Tensor::new_random(-0.1, 0.1, shape)),
            grad: None,
        })
    }
}

impl TraitNode for Parameter {
    fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("<未命名>")
    }

    fn set_name(&mut self, name: &str) {
        self.name = Some(name.to_string());
    }

    fn calc_value_by_parents(&mut self, _parents: &[NodeHandle]) -> Result<(), GraphError> {
        Err(GraphError::InvalidOperation(format!(
            "Parameter节点'{}'的值应通过set_value设置，而非通过父节点前向传播计算",
            self.name()
        )))
    }

    fn value(&self) -> Option<&Tensor> {
        self.value.as_ref()
    }

    fn set_value(&mut self, value: Option<&Tensor>) -> Result<(), GraphError> {
        self.value = value.cloned();
        Ok(())
    }

    fn clear_value(&mut self) -> Result<(), GraphError> {
        // 参数的值跨小批量存活，不随中间结果一起释放
        Ok(())
    }

    fn calc_grad_to_parent(
        &self,
        _target_parent: &NodeHandle,
        _upstream_grad: &Tensor,
        _assistant_parent: Option<&NodeHandle>,
    ) -> Result<Tensor, GraphError> {
        Err(GraphError::InvalidOperation(
            "Parameter节点没有父节点，不应向上游传播梯度".to_string(),
        ))
    }

    fn grad(&self) -> Option<&Tensor> {
        self.grad.as_ref()
    }

    fn set_grad(&mut self, grad: Option<&Tensor>) -> Result<(), GraphError> {
        self.grad = grad.cloned();
        Ok(())
    }

    fn is_trainable(&self) -> bool {
        true
    }
}
