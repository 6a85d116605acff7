use super::*;

fn solid(width: u16, height: u16, value: u8) -> PixelBuffer {
    let len = width as usize * height as usize * 4;
    PixelBuffer::packed(PixelFormat::RGB888, width, height, vec![value; len]).unwrap()
}

#[test]
fn test_content_id_length_bounds() {
    assert!(ContentId::from_bytes(&[]).is_err());
    assert!(ContentId::from_bytes(&[1u8; 65]).is_err());
    assert_eq!(ContentId::from_bytes(&[1u8]).unwrap().len(), 1);
    assert_eq!(ContentId::from_bytes(&[1u8; 64]).unwrap().len(), 64);
}

#[test]
fn test_content_id_hex() {
    let id = ContentId::from_hex("deadbeef").unwrap();
    assert_eq!(id.as_bytes(), &[0xde, 0xad, 0xbe, 0xef]);
    assert_eq!(id.to_hex(), "deadbeef");
    assert_eq!(id.to_string(), "deadbeef");

    assert!(ContentId::from_hex("abc").is_err());
    assert!(ContentId::from_hex("zz").is_err());
    assert!(ContentId::from_hex("").is_err());
    assert!(ContentId::from_hex("+f+f").is_err());
    assert!(ContentId::from_hex("-1").is_err());
}

#[test]
fn test_content_id_equality_ignores_width_padding() {
    let short = ContentId::from_bytes(b"a").unwrap();
    let padded = ContentId::from_bytes(b"a\0").unwrap();
    assert_ne!(short, padded);
    assert_eq!(short, ContentId::from_bytes(b"a").unwrap());
}

#[test]
fn test_hasher_width() {
    assert!(ContentHasher::new(0).is_err());
    assert!(ContentHasher::new(65).is_err());

    for width in [1, 8, 16, 32, 33, 64] {
        let hasher = ContentHasher::new(width).unwrap();
        assert_eq!(hasher.hash(b"pixels").len(), width);
    }
}

#[test]
fn test_hasher_deterministic() {
    let hasher = ContentHasher::default();
    assert_eq!(hasher.hash(b"abc"), hasher.hash(b"abc"));
    assert_ne!(hasher.hash(b"abc"), hasher.hash(b"abd"));
}

#[test]
fn test_hash_rect_skips_stride_padding() {
    let hasher = ContentHasher::default();
    let packed = solid(4, 3, 0x11);

    // Stride of 6 pixels with garbage in the padding.
    let mut data = vec![0xFFu8; 6 * 4 * 3];
    for row in 0..3 {
        let start = row * 6 * 4;
        data[start..start + 16].fill(0x11);
    }
    let padded = PixelBuffer::new(PixelFormat::RGB888, 4, 3, 6, data).unwrap();

    assert_eq!(hasher.hash_rect(&packed), hasher.hash_rect(&padded));
}

#[test]
fn test_hash_rect_distinguishes_shape() {
    let hasher = ContentHasher::default();
    let wide = solid(8, 2, 0);
    let tall = solid(2, 8, 0);
    assert_eq!(wide.visible_bytes(), tall.visible_bytes());
    assert_ne!(hasher.hash_rect(&wide), hasher.hash_rect(&tall));
}

#[test]
fn test_pixel_buffer_validation() {
    assert!(PixelBuffer::packed(PixelFormat::RGB888, 4, 4, vec![0u8; 63]).is_err());
    assert!(PixelBuffer::new(PixelFormat::RGB888, 4, 4, 3, vec![0u8; 64]).is_err());
    assert!(PixelBuffer::packed(PixelFormat::new(0, false), 1, 1, vec![0u8; 4]).is_err());

    // The last row does not need trailing padding.
    let buf = PixelBuffer::new(PixelFormat::RGB565, 2, 2, 4, vec![0u8; 8 + 4]).unwrap();
    assert_eq!(buf.row_bytes(), 4);
    assert_eq!(buf.stride_bytes(), 8);
}

#[test]
fn test_pixel_buffer_rejects_overflowing_stride() {
    let err = PixelBuffer::new(PixelFormat::RGB888, 2, 3, usize::MAX / 2, vec![0u8; 64]);
    assert!(matches!(err, Err(ContentError::InvalidBuffer(_))));

    let err = PixelBuffer::new(PixelFormat::RGB888, 2, 1, usize::MAX, vec![0u8; 64]);
    assert!(matches!(err, Err(ContentError::InvalidBuffer(_))));
}

#[test]
fn test_to_packed() {
    let data: Vec<u8> = (0..24u8).collect();
    let buf = PixelBuffer::new(PixelFormat::RGB565, 2, 2, 6, data).unwrap();
    let packed = buf.to_packed();

    assert!(packed.is_packed());
    assert_eq!(packed.data().as_ref(), &[0, 1, 2, 3, 12, 13, 14, 15]);
    assert_eq!(packed.visible_bytes(), 8);
}

#[test]
fn test_rect_area() {
    let rect = Rect::new(10, 20, 64, 32);
    assert_eq!(rect.area(), 2048);
    assert!(!rect.is_empty());
    assert!(Rect::new(0, 0, 0, 5).is_empty());
    assert!(solid(64, 32, 0).fits(&rect));
}
