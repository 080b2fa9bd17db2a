/*
 * @Author       : 老董
 * @Date         : 2026-08-12
 * @Description  : 节点能力接口（TraitNode）与各具体节点类型
 *
 * 图的求值驱动层只依赖这里的统一接口，从不依赖具体节点类型。
 */

mod add;
mod handle;
mod identity;
mod input;
mod mat_mul;
mod parameter;

pub(in crate::nn) use add::Add;
pub(in crate::nn) use identity::Identity;
pub(in crate::nn) use input::Input;
pub(in crate::nn) use mat_mul::MatMul;
pub(in crate::nn) use parameter::Parameter;

pub use handle::NodeHandle;

use super::GraphError;
use crate::tensor::Tensor;
use enum_dispatch::enum_dispatch;

/// 节点的唯一标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

#[enum_dispatch]
#[derive(Clone)]
pub(in crate::nn) enum NodeType {
    Input(Input),
    Parameter(Parameter),
    Identity(Identity),
    Add(Add),
    MatMul(MatMul),
}

#[enum_dispatch(NodeType)]
pub(in crate::nn) trait TraitNode {
    fn name(&self) -> &str;

    fn set_name(&mut self, name: &str);

    // 根据父节点的值计算本节点的值（调用时所有父节点的值都已预先被计算过）
    fn calc_value_by_parents(&mut self, parents: &[NodeHandle]) -> Result<(), GraphError>;

    fn value(&self) -> Option<&Tensor>;

    fn set_value(&mut self, _value: Option<&Tensor>) -> Result<(), GraphError> {
        Err(GraphError::InvalidOperation(
            "该类型节点的值不应该被手动设置".to_string(),
        ))
    }

    fn clear_value(&mut self) -> Result<(), GraphError>;

    /// VJP：给定上游梯度，计算传给某个父节点的梯度
    fn calc_grad_to_parent(
        &self,
        target_parent: &NodeHandle,
        upstream_grad: &Tensor,
        assistant_parent: Option<&NodeHandle>,
    ) -> Result<Tensor, GraphError>;

    fn grad(&self) -> Option<&Tensor>;

    fn set_grad(&mut self, grad: Option<&Tensor>) -> Result<(), GraphError>;

    fn clear_grad(&mut self) -> Result<(), GraphError> {
        self.set_grad(None)
    }

    /// 该节点的参数是否会在训练中被更新（可学习参数）
    fn is_trainable(&self) -> bool {
        false
    }
}
