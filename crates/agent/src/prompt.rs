use pazar_core::knowledge::KnowledgeBase;

const PERSONA: &str = r#"Sen "Pazar Yönetim Sistemi" için akıllı bir asistansın.
Aşağıdaki 'Sanal Pazar Verileri'ne tam erişimin var.
Kullanıcı sana soru sorduğunda bu verilerden cevap ver."#;

const ANSWER_RULES: &str = r#"KURALLAR:
1. Kullanıcı bir ürünün nerede olduğunu sorarsa pazarlardaki fiyatları karşılaştır ve en ucuz pazarı fiyatıyla söyle.
2. Kullanıcı bir yere gitmek istiyorsa veya "beni oraya götür" derse ya da bir ürünü/pazarı bulduysan, cevabına NAVIGATE aksiyonu ekle.
3. Sohbet normal devam ediyorsa aksiyon ekleme, sadece metin dön.
4. Aksiyonlarda sadece yukarıdaki verilerde geçen ID'leri kullan.
5. Çıktın HER ZAMAN tek bir JSON nesnesi olmalı, başka hiçbir metin ekleme:
   {
     "text": "Kullanıcıya gösterilecek mesaj",
     "action": { "type": "NAVIGATE", "marketId": "market_1", "productId": "p_tom" }
   }
   "action" alanı opsiyoneldir; "productId" sadece bir ürün gösteriliyorsa eklenir."#;

/// Builds the single combined prompt sent to the model: fixed system context
/// (persona, catalog, output contract) followed by the user's message.
#[derive(Clone, Debug)]
pub struct PromptComposer {
    system_context: String,
}

impl PromptComposer {
    pub fn new(knowledge: &KnowledgeBase) -> Self {
        let system_context =
            format!("{PERSONA}\n\nVERİLER:\n{}\n{ANSWER_RULES}", knowledge.render_context());
        Self { system_context }
    }

    pub fn system_context(&self) -> &str {
        &self.system_context
    }

    pub fn compose(&self, message: &str) -> String {
        format!("{}\n\nKULLANICI: {}\nASİSTAN (JSON):", self.system_context, message)
    }
}

#[cfg(test)]
mod tests {
    use pazar_core::knowledge::KnowledgeBase;

    use super::PromptComposer;

    #[test]
    fn system_context_embeds_catalog_and_output_contract() {
        let composer = PromptComposer::new(&KnowledgeBase::builtin());
        let context = composer.system_context();

        assert!(context.contains("Beşiktaş Cumartesi Pazarı (ID: market_1)"));
        assert!(context.contains("Organik Yumurta (ID: p_egg) 45 TL/10lu"));
        assert!(context.contains("\"type\": \"NAVIGATE\""));
        assert!(context.contains("HER ZAMAN tek bir JSON nesnesi"));
    }

    #[test]
    fn composed_prompt_ends_with_user_turn() {
        let composer = PromptComposer::new(&KnowledgeBase::builtin());
        let prompt = composer.compose("Domates nerede?");

        assert!(prompt.starts_with(composer.system_context()));
        assert!(prompt.ends_with("KULLANICI: Domates nerede?\nASİSTAN (JSON):"));
    }
}
