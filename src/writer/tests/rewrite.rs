use crate::nn::Graph;
use crate::tensor::Tensor;
use crate::writer::{expose_gradients, WriteError};
use approx::assert_abs_diff_eq;

#[test]
fn test_zero_outputs_is_fatal() {
    let mut graph = Graph::new();
    assert!(matches!(
        expose_gradients(&mut graph, &[]),
        Err(WriteError::NoDiagnosticRoot)
    ));
}

#[test]
fn test_two_inputs_get_two_taps() {
    let mut graph = Graph::new();
    let x1 = graph.new_input_node(1, Some("x1")).unwrap();
    let x2 = graph.new_input_node(1, Some("x2")).unwrap();
    let y = graph.new_add_node(&[x1, x2], Some("y")).unwrap();

    let nodes_before = graph.nodes_count();
    let (root, taps) = expose_gradients(&mut graph, &[y]).unwrap();

    assert_eq!(root, y);
    assert_eq!(taps.len(), 2, "两个被跟踪输入应恰好产生两个抽头");
    assert_eq!(graph.nodes_count(), nodes_before + 2);
    assert_eq!(graph.get_node_name(taps[0]).unwrap(), "x1.grad");
    assert_eq!(graph.get_node_name(taps[1]).unwrap(), "x2.grad");
    assert!(
        taps.iter()
            .all(|&tap| graph.get_node(tap).unwrap().is_always_backward()),
        "抽头应被标记为始终参与反向传播"
    );

    // 全表改边：y 现在消费抽头而非原输入
    assert_eq!(graph.get_node_parents(y).unwrap(), taps);
    assert_eq!(graph.get_node_parents(taps[0]).unwrap(), vec![x1]);
}

#[test]
fn test_taps_cover_learnable_params_too() {
    let mut graph = Graph::new();
    let x = graph.new_input_node(2, Some("x")).unwrap();
    let w = graph.new_parameter_node(&[1, 2], Some("w")).unwrap();
    let y = graph.new_mat_mul_node(w, x, Some("y")).unwrap();

    let (_, taps) = expose_gradients(&mut graph, &[y]).unwrap();
    let names: Vec<&str> = taps
        .iter()
        .map(|&id| graph.get_node_name(id).unwrap())
        .collect();
    assert_eq!(names, vec!["x.grad", "w.grad"]);
}

#[test]
fn test_forward_unchanged_and_gradients_addressable() {
    // 改写前后前向数值逐位一致；反向传播后每个抽头都有梯度可读
    let build = |graph: &mut Graph| {
        let x = graph.new_input_node(2, Some("x")).unwrap();
        let w = graph.new_parameter_node(&[1, 2], Some("w")).unwrap();
        let y = graph.new_mat_mul_node(w, x, Some("y")).unwrap();
        graph
            .set_node_value(w, Some(&Tensor::new(&[2.0, 3.0], &[1, 2])))
            .unwrap();
        graph
            .set_node_value(x, Some(&Tensor::new(&[4.0, 5.0], &[2, 1])))
            .unwrap();
        y
    };

    let mut plain = Graph::with_name("plain");
    let y_plain = build(&mut plain);
    plain.bump_eval_generation();
    plain.forward(y_plain).unwrap();
    let expected = plain.get_node_value(y_plain).unwrap().unwrap()[[0, 0]];

    let mut rewritten = Graph::with_name("rewritten");
    let y = build(&mut rewritten);
    let (root, taps) = expose_gradients(&mut rewritten, &[y]).unwrap();
    rewritten.bump_eval_generation();
    rewritten.forward(root).unwrap();
    let actual = rewritten.get_node_value(root).unwrap().unwrap()[[0, 0]];
    assert_eq!(expected.to_bits(), actual.to_bits());

    rewritten.backward_from(root).unwrap();
    // x.grad = wᵀ×1 = [2, 3]ᵀ；w.grad = 1×xᵀ = [4, 5]
    let x_grad = rewritten.get_node_grad(taps[0]).unwrap().unwrap();
    assert_abs_diff_eq!(x_grad[[0, 0]], 2.0);
    assert_abs_diff_eq!(x_grad[[1, 0]], 3.0);
    let w_grad = rewritten.get_node_grad(taps[1]).unwrap().unwrap();
    assert_abs_diff_eq!(w_grad[[0, 0]], 4.0);
    assert_abs_diff_eq!(w_grad[[0, 1]], 5.0);
}
