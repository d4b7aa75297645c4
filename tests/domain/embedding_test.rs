use minutes::domain::Embedding;

#[test]
fn given_identical_vectors_when_cosine_then_returns_one() {
    let a = Embedding::new(vec![0.5, 0.3, 0.2]);
    let b = Embedding::new(vec![0.5, 0.3, 0.2]);

    let similarity = a.cosine_similarity(&b);

    assert!((similarity - 1.0).abs() < 1e-6);
}

#[test]
fn given_orthogonal_vectors_when_cosine_then_returns_zero() {
    let a = Embedding::new(vec![1.0, 0.0]);
    let b = Embedding::new(vec![0.0, 1.0]);

    let similarity = a.cosine_similarity(&b);

    assert!(similarity.abs() < 1e-6);
}

#[test]
fn given_opposite_vectors_when_cosine_then_returns_negative_one() {
    let a = Embedding::new(vec![1.0, 2.0]);
    let b = Embedding::new(vec![-1.0, -2.0]);

    let similarity = a.cosine_similarity(&b);

    assert!((similarity + 1.0).abs() < 1e-6);
}

#[test]
fn given_zero_vector_when_cosine_then_returns_zero() {
    let a = Embedding::new(vec![0.0, 0.0]);
    let b = Embedding::new(vec![1.0, 1.0]);

    assert_eq!(a.cosine_similarity(&b), 0.0);
}

#[test]
fn given_mismatched_dimensions_when_cosine_then_returns_zero() {
    let a = Embedding::new(vec![1.0, 2.0]);
    let b = Embedding::new(vec![1.0, 2.0, 3.0]);

    assert_eq!(a.cosine_similarity(&b), 0.0);
}
