//! Validate a few rows locally and print their wire payloads. No network.

use boleto::core::*;

fn main() {
    let rows = r#"[
        {
            "codigo": "BOL001",
            "nome": "João da Silva",
            "email": "joao@email.com",
            "documento": "356.490.490-50",
            "telefone": "(11) 98765-4321",
            "servico_nome": "Consultoria",
            "servico_descricao": "Consultoria mensal",
            "valor": 1500.50,
            "data_vencimento": "2099-01-10",
            "juros_mensal": 2.5,
            "multa": "10,00"
        },
        {
            "codigo": "BOL002",
            "nome": "Empresa XYZ Ltda",
            "email": "financeiro@xyz.com.br",
            "documento": "12.345.678/0001-90",
            "servico_nome": "Desenvolvimento",
            "servico_descricao": "Desenvolvimento de sistema - Fase 1",
            "valor": "R$ 5.000,00",
            "data_vencimento": "2099-01-15"
        }
    ]"#;

    let records: Vec<RawRecord> = serde_json::from_str(rows).unwrap();
    let options = MappingOptions::default();

    for (i, record) in records.iter().enumerate() {
        println!("=== Row {} ===", i + 1);
        match record.to_request(&options) {
            Ok(request) => {
                println!("  total: R$ {}", request.total_amount());
                println!(
                    "{}",
                    serde_json::to_string_pretty(&request.to_wire_payload()).unwrap()
                );
            }
            // The second row's CNPJ has wrong check digits
            Err(e) => println!("  invalid: {e}"),
        }
    }

    println!("\n=== Tax IDs ===");
    for raw in ["529.982.247-25", "529.982.247-26", "11.222.333/0001-81", "1234567890123"] {
        match TaxId::parse(raw) {
            Ok(id) => println!("  {raw}: {} {}", id.kind(), id.formatted()),
            Err(e) => println!("  {raw}: {e}"),
        }
    }
}
