/*
 * @Author       : 老董
 * @Date         : 2026-08-13
 * @Description  : 梯度暴露改写（诊断模式）：为被跟踪节点插入恒等"抽头"，
 *                 全表改边后重算求值顺序，前向数值保持逐位不变
 */

use super::{resolve_input_closure, WriteError};
use crate::nn::{Graph, NodeId};

/// 对图做一次梯度暴露改写，返回`(反向传播根节点, 插入的抽头节点列表)`。
///
/// 前置条件是恰好一个指定输出：零个是致命配置错误；多于一个降级为
/// 警告并只用第一个。被跟踪集合 = 根的输入节点闭包 ∪ 根可达的全部
/// 可学习参数节点。每个被跟踪节点得到一个恒等抽头（命名`{原名}.grad`），
/// 标记为始终参与反向传播，且全表中原先指向该节点的边全部改指抽头。
/// 改写完成后重算一次拓扑求值顺序。
pub fn expose_gradients(
    graph: &mut Graph,
    outputs: &[NodeId],
) -> Result<(NodeId, Vec<NodeId>), WriteError> {
    let Some(&root) = outputs.first() else {
        return Err(WriteError::NoDiagnosticRoot);
    };
    if outputs.len() > 1 {
        eprintln!(
            "[only_eval 警告] 诊断模式收到{}个输出节点，只使用第一个",
            outputs.len()
        );
    }

    // 被跟踪集合按首次遇见顺序去重
    let mut tracked = resolve_input_closure(graph, &[root])?;
    for id in graph.learnable_param_nodes(root)? {
        if !tracked.contains(&id) {
            tracked.push(id);
        }
    }

    let mut taps = Vec::with_capacity(tracked.len());
    for original in tracked {
        let tap_name = format!("{}.grad", graph.get_node_name(original)?);
        let tap = graph.new_identity_node(original, Some(&tap_name))?;
        // 即便无人消费其输出，抽头也必须留在反向传播路径上
        graph.mark_always_backward(tap)?;
        graph.redirect_node_children(original, tap)?;
        taps.push(tap);
    }

    // 结构编辑之后、分配与执行之前，求值顺序必须基于新边集重算
    graph.compile()?;

    Ok((root, taps))
}
