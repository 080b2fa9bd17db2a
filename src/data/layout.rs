/*
 * @Author       : 老董
 * @Date         : 2026-08-12
 * @Description  : MbLayout - 打包变长序列批次的布局描述
 */

use super::DataError;

/// 一条序列在打包缓冲中的位置：占用的并行槽位与有效时间区间 `[t_begin, t_end)`。
///
/// 边界允许越出 `[0, 宽度]`（如跨块截断的序列），消费方负责裁剪。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceInfo {
    pub slot: usize,
    pub t_begin: i64,
    pub t_end: i64,
}

/// 小批量布局：并行槽位数、时间宽度、以及各序列的有效区间（按序）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MbLayout {
    num_parallel_sequences: usize,
    num_time_steps: usize,
    sequences: Vec<SequenceInfo>,
}

impl MbLayout {
    pub fn new(
        num_parallel_sequences: usize,
        num_time_steps: usize,
        sequences: Vec<SequenceInfo>,
    ) -> Result<Self, DataError> {
        if num_parallel_sequences == 0 {
            return Err(DataError::InvalidLayout("并行槽位数必须大于0".to_string()));
        }
        for seq in &sequences {
            if seq.slot >= num_parallel_sequences {
                return Err(DataError::InvalidLayout(format!(
                    "序列槽位{}超出并行槽位数{}",
                    seq.slot, num_parallel_sequences
                )));
            }
        }
        Ok(Self {
            num_parallel_sequences,
            num_time_steps,
            sequences,
        })
    }

    /// 帧模式布局：`num_samples`个并行槽位，各占一条长度为1的序列。
    /// 无布局的缓冲（聚合量、参数）按`frame_mode(1)`处理。
    pub fn frame_mode(num_samples: usize) -> Self {
        let sequences = (0..num_samples)
            .map(|slot| SequenceInfo {
                slot,
                t_begin: 0,
                t_end: 1,
            })
            .collect();
        Self {
            num_parallel_sequences: num_samples.max(1),
            num_time_steps: 1,
            sequences,
        }
    }

    pub fn num_parallel_sequences(&self) -> usize {
        self.num_parallel_sequences
    }

    pub fn num_time_steps(&self) -> usize {
        self.num_time_steps
    }

    pub fn sequences(&self) -> &[SequenceInfo] {
        &self.sequences
    }

    /// 布局内的有效样本（时间步）总数，边界先裁剪到 `[0, 宽度]`
    pub fn num_samples(&self) -> usize {
        let width = self.num_time_steps as i64;
        self.sequences
            .iter()
            .map(|seq| {
                let begin = seq.t_begin.clamp(0, width);
                let end = seq.t_end.clamp(0, width);
                (end - begin).max(0) as usize
            })
            .sum()
    }
}
