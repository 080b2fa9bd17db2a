use super::{MbLayout, MinibatchSource, PackedSequenceSource, SequenceInfo};
use crate::nn::Graph;
use crate::tensor::Tensor;
use crate::writer::InputBindings;

#[test]
fn test_layout_new_and_validation() {
    let layout = MbLayout::new(
        2,
        3,
        vec![
            SequenceInfo {
                slot: 0,
                t_begin: 0,
                t_end: 3,
            },
            SequenceInfo {
                slot: 1,
                t_begin: 0,
                t_end: 2,
            },
        ],
    )
    .unwrap();
    assert_eq!(layout.num_parallel_sequences(), 2);
    assert_eq!(layout.num_time_steps(), 3);
    assert_eq!(layout.num_samples(), 5, "样本数应为各序列有效长度之和");

    // 槽位数为0或槽位越界都应拒绝
    assert!(MbLayout::new(0, 1, vec![]).is_err());
    assert!(MbLayout::new(
        1,
        1,
        vec![SequenceInfo {
            slot: 1,
            t_begin: 0,
            t_end: 1
        }]
    )
    .is_err());
}

#[test]
fn test_layout_frame_mode() {
    let layout = MbLayout::frame_mode(3);
    assert_eq!(layout.num_parallel_sequences(), 3);
    assert_eq!(layout.num_time_steps(), 1);
    assert_eq!(layout.sequences().len(), 3);
    for (slot, seq) in layout.sequences().iter().enumerate() {
        assert_eq!((seq.slot, seq.t_begin, seq.t_end), (slot, 0, 1));
    }
    // 0个样本也要保证至少1个槽位
    assert_eq!(MbLayout::frame_mode(0).num_parallel_sequences(), 1);
}

#[test]
fn test_layout_num_samples_clips_range() {
    // 越界区间按[0, width)裁剪后计数
    let layout = MbLayout::new(
        1,
        2,
        vec![SequenceInfo {
            slot: 0,
            t_begin: -1,
            t_end: 5,
        }],
    )
    .unwrap();
    assert_eq!(layout.num_samples(), 2);
}

fn make_graph_with_input(row_dim: usize) -> (Graph, InputBindings) {
    let mut graph = Graph::new();
    let input = graph.new_input_node(row_dim, Some("features")).unwrap();
    let bindings = InputBindings::bind_inputs(&graph, &[input]).unwrap();
    (graph, bindings)
}

#[test]
fn test_packed_source_single_sequence() {
    let (mut graph, bindings) = make_graph_with_input(2);
    let seq = Tensor::new(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]);
    let mut source = PackedSequenceSource::new(vec![("features".to_string(), vec![seq])]).unwrap();

    source.start_minibatch_loop(10, 0, None);
    let samples = source.next_minibatch(&mut graph, &bindings).unwrap();
    assert_eq!(samples, 3, "长度3的序列应计3个样本");

    let input = graph.get_node_by_name("features").unwrap();
    let value = graph.get_node_value(input).unwrap().unwrap();
    assert_eq!(value.shape(), &[2, 3]);
    let layout = graph.get_node_layout(input).unwrap().unwrap();
    assert_eq!(layout.num_parallel_sequences(), 1);
    assert_eq!(layout.num_time_steps(), 3);

    // 再取一次应返回0表示耗尽（正常终止，不是错误）
    assert_eq!(source.next_minibatch(&mut graph, &bindings).unwrap(), 0);
}

#[test]
fn test_packed_source_two_parallel_sequences() {
    let (mut graph, bindings) = make_graph_with_input(1);
    let seq_a = Tensor::new(&[1.0, 2.0, 3.0], &[1, 3]);
    let seq_b = Tensor::new(&[7.0, 8.0], &[1, 2]);
    let mut source = PackedSequenceSource::new(vec![(
        "features".to_string(),
        vec![seq_a, seq_b],
    )])
    .unwrap()
    .with_num_parallel(2);

    source.start_minibatch_loop(10, 0, None);
    let samples = source.next_minibatch(&mut graph, &bindings).unwrap();
    assert_eq!(samples, 5);

    let input = graph.get_node_by_name("features").unwrap();
    let value = graph.get_node_value(input).unwrap().unwrap();
    // 2个槽位、宽度3：时间步t、槽位s的列号 = s + t*2
    assert_eq!(value.shape(), &[1, 6]);
    assert_eq!(value[[0, 0]], 1.0); // 序列A, t=0
    assert_eq!(value[[0, 1]], 7.0); // 序列B, t=0
    assert_eq!(value[[0, 2]], 2.0); // 序列A, t=1
    assert_eq!(value[[0, 3]], 8.0); // 序列B, t=1
    assert_eq!(value[[0, 4]], 3.0); // 序列A, t=2
    assert_eq!(value[[0, 5]], 0.0, "序列B超出长度的槽位应零填充");

    let layout = graph.get_node_layout(input).unwrap().unwrap();
    assert_eq!(layout.sequences()[0].t_end, 3);
    assert_eq!(layout.sequences()[1].t_end, 2);
}

#[test]
fn test_packed_source_respects_mb_size_and_budget() {
    let (mut graph, bindings) = make_graph_with_input(1);
    let seqs = vec![
        Tensor::new(&[1.0, 2.0], &[1, 2]),
        Tensor::new(&[3.0, 4.0], &[1, 2]),
        Tensor::new(&[5.0, 6.0], &[1, 2]),
    ];
    let mut source = PackedSequenceSource::new(vec![("features".to_string(), seqs)])
        .unwrap()
        .with_num_parallel(4);

    // 批大小3只装得下一条长度2的序列（装第二条就超了）
    source.start_minibatch_loop(3, 0, None);
    assert_eq!(source.next_minibatch(&mut graph, &bindings).unwrap(), 2);

    // 样本预算2：第一批吃掉预算后立即耗尽
    source.start_minibatch_loop(10, 0, Some(2));
    assert_eq!(source.next_minibatch(&mut graph, &bindings).unwrap(), 2);
    assert_eq!(source.next_minibatch(&mut graph, &bindings).unwrap(), 0);
}

#[test]
fn test_packed_source_rejects_mismatched_streams() {
    let one = vec![Tensor::new(&[1.0], &[1, 1])];
    let two = vec![
        Tensor::new(&[1.0], &[1, 1]),
        Tensor::new(&[2.0], &[1, 1]),
    ];
    assert!(
        PackedSequenceSource::new(vec![
            ("a".to_string(), one),
            ("b".to_string(), two)
        ])
        .is_err(),
        "各输入流的序列条数不一致应被拒绝"
    );
}
