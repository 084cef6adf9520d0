use boleto::core::*;

#[test]
fn known_valid_cpfs() {
    for raw in ["529.982.247-25", "52998224725", "356.490.490-50", "123.456.789-09"] {
        let id = TaxId::parse(raw).unwrap();
        assert_eq!(id.kind(), TaxIdKind::Cpf, "{raw}");
        assert_eq!(id.identity().len(), 11);
    }
}

#[test]
fn known_valid_cnpj() {
    let id = TaxId::parse("11.222.333/0001-81").unwrap();
    assert_eq!(id.kind(), TaxIdKind::Cnpj);
    assert_eq!(id.identity(), "11222333000181");
    assert_eq!(id.formatted(), "11.222.333/0001-81");
    assert_eq!(id.to_string(), "11.222.333/0001-81");
}

#[test]
fn formatting_is_stripped() {
    assert_eq!(strip_formatting(" 356.490.490-50 "), "35649049050");
    assert_eq!(strip_formatting("11.222.333/0001-81"), "11222333000181");
    assert_eq!(
        validate_tax_id("356 490 490 50").unwrap(),
        ("35649049050".to_string(), TaxIdKind::Cpf)
    );
}

#[test]
fn thirteen_digits_is_format_error() {
    let err = validate_tax_id("1122233300018").unwrap_err();
    match err {
        TaxIdError::InvalidFormat { reason, .. } => assert!(reason.contains("length")),
        other => panic!("expected InvalidFormat, got {other:?}"),
    }
}

#[test]
fn wrong_check_digits() {
    assert!(matches!(
        validate_tax_id("529.982.247-26"),
        Err(TaxIdError::ChecksumMismatch {
            kind: TaxIdKind::Cpf,
            ..
        })
    ));
    assert!(matches!(
        validate_tax_id("11.222.333/0001-82"),
        Err(TaxIdError::ChecksumMismatch {
            kind: TaxIdKind::Cnpj,
            ..
        })
    ));
    // Sample data with made-up digits
    assert!(validate_tax_id("123.456.789-10").is_err());
    assert!(validate_tax_id("12.345.678/0001-90").is_err());
}

#[test]
fn repeated_digits_rejected_before_checksum() {
    for raw in ["000.000.000-00", "111.111.111-11", "99999999999999"] {
        assert!(
            matches!(validate_tax_id(raw), Err(TaxIdError::InvalidFormat { .. })),
            "{raw}"
        );
    }
}

#[test]
fn non_digits_rejected() {
    assert!(matches!(
        validate_tax_id("5299822472A"),
        Err(TaxIdError::InvalidFormat { .. })
    ));
    assert!(matches!(
        validate_tax_id(""),
        Err(TaxIdError::InvalidFormat { .. })
    ));
}

#[test]
fn explicit_kind() {
    assert!(TaxId::with_kind("529.982.247-25", TaxIdKind::Cpf).is_ok());
    assert!(matches!(
        TaxId::with_kind("529.982.247-25", TaxIdKind::Cnpj),
        Err(TaxIdError::InvalidFormat { .. })
    ));
}

#[test]
fn kind_codes() {
    assert_eq!(TaxIdKind::from_code("cpf"), Some(TaxIdKind::Cpf));
    assert_eq!(TaxIdKind::from_code("CNPJ"), Some(TaxIdKind::Cnpj));
    assert_eq!(TaxIdKind::from_code("RG"), None);
    assert_eq!(TaxIdKind::Cnpj.digit_count(), 14);
}

#[test]
fn error_converts_to_field_error() {
    let err: ValidationError = validate_tax_id("123").unwrap_err().into();
    assert_eq!(err.field, "document");
    assert_eq!(err.nested("customer").field, "customer.document");
}
