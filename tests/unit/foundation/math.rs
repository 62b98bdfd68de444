use super::*;

#[test]
fn fnv_seeded_hash_is_stable() {
    let mut a = Fnv1a64::new_default();
    a.write_bytes(b"coverforge");
    let mut b = Fnv1a64::new(Fnv1a64::OFFSET_BASIS);
    b.write_bytes(b"cover");
    b.write_bytes(b"forge");
    assert_eq!(a.finish(), b.finish());
    assert_eq!(hash_str("coverforge"), a.finish());
}

#[test]
fn position_hash_depends_on_seed_and_position() {
    assert_eq!(hash_u32(7, 3, 4), hash_u32(7, 3, 4));
    assert_ne!(hash_u32(7, 3, 4), hash_u32(8, 3, 4));
    assert_ne!(hash_u32(7, 3, 4), hash_u32(7, 4, 3));
}

#[test]
fn mul_div255_variants_align() {
    for x in [0u16, 1, 127, 255] {
        for y in [0u16, 1, 127, 255] {
            assert_eq!(u16::from(mul_div255_u8(x, y)), mul_div255_u16(x, y));
        }
    }
    assert_eq!(mul_div255_u8(255, 255), 255);
    assert_eq!(mul_div255_u8(255, 0), 0);
}
