use lanebench::{
    elementwise_transform, elementwise_transform_with, scalar_elementwise_transform,
    transform_element, ElementKind, WidthDescriptor,
};

fn same(x: f32, y: f32) -> bool {
    x == y || (x.is_nan() && y.is_nan())
}

#[test]
fn test_transform_forced_scalar_matches_vector() {
    let a: Vec<f32> = (0..2051).map(|i| (i as f32 * 0.017).sin() * 4.0).collect();
    let b: Vec<f32> = (0..2051).map(|i| (i as f32 * 0.031).cos() * 4.0).collect();

    let scalar = elementwise_transform_with(WidthDescriptor::scalar(ElementKind::Float), &a, &b)
        .unwrap();
    let vector = elementwise_transform(&a, &b).unwrap();
    assert_eq!(scalar.len(), vector.len());
    for (i, (&x, &y)) in scalar.iter().zip(&vector).enumerate() {
        assert!(same(x, y), "index {i}: {x} vs {y}");
    }
}

#[test]
fn test_transform_nan_identical_in_body_and_tail() {
    // 19 elements: two 8-lane blocks and a 3-element tail, all with sin < 0
    let a = vec![2.0f32; 19];
    let b = vec![2.0f32; 19];
    for lanes in [1, 2, 4, 8, 16] {
        let width = WidthDescriptor::new(lanes, lanes * 32).unwrap();
        let out = elementwise_transform_with(width, &a, &b).unwrap();
        assert!(out.iter().all(|x| x.is_nan()), "{lanes} lanes");
    }
}

#[test]
fn test_transform_element_formula() {
    let out = scalar_elementwise_transform(&[0.25, 3.0], &[2.0, 0.5]).unwrap();
    assert_eq!(out[0], 0.5f32.sin().sqrt());
    assert_eq!(out[1], transform_element(3.0, 0.5));
}
