use super::*;

#[test]
fn zeroed_works_for_various_sizes() {
    let b1 = Block::zeroed(1);
    assert_eq!(b1.as_bytes(), &[0u8]);

    let b512 = Block::zeroed(512);
    assert_eq!(b512.len(), 512);
    assert!(b512.as_bytes().iter().all(|&b| b == 0));

    let b0 = Block::zeroed(0);
    assert!(b0.is_empty());
}

#[test]
fn xor_into_is_byte_exact() {
    let mut dst = [0xFFu8, 0x00, 0xAA, 0x55];
    let src = [0x0Fu8, 0x0F, 0xF0, 0xF0];
    xor_into(&mut dst, &src);
    assert_eq!(dst, [0xF0, 0x0F, 0x5A, 0xA5]);
}

#[test]
fn xor_twice_restores_the_original() {
    let original = [0x12u8, 0x34, 0x56, 0x78];
    let mask = [0xDEu8, 0xAD, 0xBE, 0xEF];

    let mut buf = original;
    xor_into(&mut buf, &mask);
    assert_ne!(buf, original);
    xor_into(&mut buf, &mask);
    assert_eq!(buf, original);
}

#[test]
fn block_xor_in_place_accumulates() {
    let mut acc = Block::zeroed(4);
    acc.xor_in_place(&[1, 2, 3, 4]);
    acc.xor_in_place(&[4, 3, 2, 1]);
    assert_eq!(acc.as_bytes(), &[5, 1, 1, 5]);
}

#[test]
fn fill_zero_and_copy_from() {
    let mut b = Block::zeroed(4);
    b.copy_from(&[9, 8, 7, 6]);
    assert_eq!(b.as_bytes(), &[9, 8, 7, 6]);
    b.fill_zero();
    assert_eq!(b.as_bytes(), &[0, 0, 0, 0]);
}

#[test]
#[should_panic(expected = "XOR operands must be block-sized")]
fn xor_into_panics_on_length_mismatch() {
    let mut dst = [0u8; 4];
    xor_into(&mut dst, &[0u8; 3]);
}

#[test]
fn as_bytes_mut_exposes_backing_storage() {
    let mut b = Block::zeroed(3);
    b.as_bytes_mut()[1] = 0xAB;
    assert_eq!(b.as_bytes(), &[0, 0xAB, 0]);
}
