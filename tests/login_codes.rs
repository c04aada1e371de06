use proptest::prelude::*;
use roomboard::id::{generate_login_code, LOGIN_CODE_ALPHABET, LOGIN_CODE_LEN};

proptest! {
    /// Whatever codes are already taken, a freshly generated code has the
    /// fixed length, draws only from the alphabet, and collides with none of
    /// them.
    #[test]
    fn generated_codes_are_well_formed_and_unique(
        taken in proptest::collection::hash_set("[A-HJ-NP-Z2-9]{6}", 0..32)
    ) {
        let code = generate_login_code(|candidate| taken.contains(candidate));
        prop_assert_eq!(code.len(), LOGIN_CODE_LEN);
        prop_assert!(code.bytes().all(|b| LOGIN_CODE_ALPHABET.contains(&b)));
        prop_assert!(!taken.contains(&code));
    }
}
