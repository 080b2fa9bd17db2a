/*
 * @Author       : 老董
 * @Date         : 2026-08-13
 * @Description  : 输入绑定：输入流名 → 节点ID 的映射，供数据源按名填充
 */

use crate::nn::{Graph, GraphError, NodeId};

/// 输入节点绑定表。纯数据结构，构造时不触碰图的任何状态；
/// 数据源每次迭代按名字查到节点ID，再经图 API 写入值与布局。
#[derive(Debug, Clone, Default)]
pub struct InputBindings {
    entries: Vec<(String, NodeId)>,
}

impl InputBindings {
    /// 为输入闭包中的每个输入节点建立"名称 → 节点ID"条目
    pub fn bind_inputs(graph: &Graph, input_nodes: &[NodeId]) -> Result<Self, GraphError> {
        let mut entries = Vec::with_capacity(input_nodes.len());
        for &id in input_nodes {
            entries.push((graph.get_node_name(id)?.to_string(), id));
        }
        Ok(Self { entries })
    }

    pub fn get(&self, name: &str) -> Option<NodeId> {
        self.entries
            .iter()
            .find(|(entry_name, _)| entry_name == name)
            .map(|&(_, id)| id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, NodeId)> {
        self.entries.iter().map(|(name, id)| (name.as_str(), *id))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
