/*
 * @Author       : 老董
 * @Date         : 2026-08-13
 * @Description  : 输出流管理：每个输出节点一个目的流，循环前开、循环后冲刷关闭
 */

use super::{WriteError, WriteFormattingOptions};
use crate::nn::{Graph, NodeId};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// 路径哨兵：所有节点共用标准输出
const STDOUT_SENTINEL: &str = "-";

enum Destination {
    Stdout(std::io::Stdout),
    File(BufWriter<File>),
}

impl Destination {
    fn as_write(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(stdout) => stdout,
            Self::File(writer) => writer,
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.as_write().flush()
    }
}

/// 输出流管理器。`base_path`为`"-"`时全部节点路由到标准输出；
/// 否则每个节点的目的文件是`{base_path}.{节点名}`，中间目录按需创建。
pub struct OutputStreamManager {
    destinations: HashMap<NodeId, Destination>,
    order: Vec<NodeId>,
}

impl OutputStreamManager {
    pub fn open(graph: &Graph, nodes: &[NodeId], base_path: &str) -> Result<Self, WriteError> {
        let mut destinations = HashMap::new();
        let mut order = Vec::new();
        for &id in nodes {
            let destination = if base_path == STDOUT_SENTINEL {
                Destination::Stdout(std::io::stdout())
            } else {
                let node_name = graph.get_node_name(id)?;
                let path = format!("{base_path}.{node_name}");
                if let Some(parent) = Path::new(&path).parent() {
                    if !parent.as_os_str().is_empty() {
                        std::fs::create_dir_all(parent)?;
                    }
                }
                Destination::File(BufWriter::new(File::create(&path)?))
            };
            destinations.insert(id, destination);
            order.push(id);
        }
        Ok(Self {
            destinations,
            order,
        })
    }

    pub fn writer(&mut self, id: NodeId) -> Result<&mut dyn Write, WriteError> {
        self.destinations
            .get_mut(&id)
            .map(Destination::as_write)
            .ok_or_else(|| WriteError::InvalidConfig(format!("节点{id:?}没有对应的输出流")))
    }

    /// 循环前对每个流写一次前言（文本替换按各自节点名生效）
    pub fn write_prologue(
        &mut self,
        graph: &Graph,
        options: &WriteFormattingOptions,
    ) -> Result<(), WriteError> {
        for id in self.order.clone() {
            let prologue = options.processed(graph.get_node_name(id)?).prologue;
            self.writer(id)?.write_all(prologue.as_bytes())?;
        }
        Ok(())
    }

    /// 循环后对每个流写一次尾声
    pub fn write_epilogue(
        &mut self,
        graph: &Graph,
        options: &WriteFormattingOptions,
    ) -> Result<(), WriteError> {
        for id in self.order.clone() {
            let epilogue = options.processed(graph.get_node_name(id)?).epilogue;
            self.writer(id)?.write_all(epilogue.as_bytes())?;
        }
        Ok(())
    }

    /// 结束前显式冲刷全部目的流，让 I/O 失败浮出水面而非销毁时静默丢失
    pub fn flush_all(&mut self) -> Result<(), WriteError> {
        for destination in self.destinations.values_mut() {
            destination.flush()?;
        }
        Ok(())
    }
}
