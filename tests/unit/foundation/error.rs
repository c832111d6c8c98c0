use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        FilterChainError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        FilterChainError::allocation("x")
            .to_string()
            .contains("allocation error:")
    );
    assert!(FilterChainError::draw("x").to_string().contains("draw error:"));
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = FilterChainError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
