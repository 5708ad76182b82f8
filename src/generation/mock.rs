use std::sync::Mutex;

use tracing::debug;

use super::prompt::{
    MAX_SUGGESTIONS,
    MIN_SUGGESTIONS,
};
use crate::core::{
    random::pick_index,
    FiszkiError,
    FlashcardSuggestion,
    RandomSource,
    SystemRandom,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topic {
    pub key: String,
    pub entries: Vec<FlashcardSuggestion>,
}

/// Ordered topic -> word list table backing offline suggestions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicTable {
    topics: Vec<Topic>,
}

// (source word, target word, example sentence with translation)
type Entry = (&'static str, &'static str, &'static str);

const DAILY_ROUTINES: &[Entry] = &[
    ("budzić się", "despertarse", "Me despierto a las siete. (Budzę się o siódmej.)"),
    ("myć się", "lavarse", "Me lavo la cara cada mañana. (Myję twarz każdego ranka.)"),
    ("ubierać się", "vestirse", "Me visto rápidamente. (Ubieram się szybko.)"),
    ("śniadanie", "el desayuno", "Tomo el desayuno a las ocho. (Jem śniadanie o ósmej.)"),
    ("iść do pracy", "ir al trabajo", "Voy al trabajo en autobús. (Jadę do pracy autobusem.)"),
    ("wracać do domu", "volver a casa", "Vuelvo a casa a las cinco. (Wracam do domu o piątej.)"),
    ("gotować obiad", "preparar la comida", "Preparo la comida para mi familia. (Gotuję obiad dla rodziny.)"),
    ("odpoczywać", "descansar", "Descanso un poco después del trabajo. (Odpoczywam trochę po pracy.)"),
    ("oglądać telewizję", "ver la televisión", "Veo la televisión por la noche. (Oglądam telewizję wieczorem.)"),
    ("iść spać", "irse a dormir", "Me voy a dormir a las once. (Idę spać o jedenastej.)"),
];

const FOOD_AND_RESTAURANT: &[Entry] = &[
    ("zamawiać", "pedir", "¿Puedo pedir el menú? (Czy mogę prosić o menu?)"),
    ("rachunek", "la cuenta", "La cuenta, por favor. (Poproszę rachunek.)"),
    ("przystawka", "el entrante", "De entrante quiero una sopa. (Na przystawkę chcę zupę.)"),
    ("danie główne", "el plato principal", "El plato principal es pescado. (Daniem głównym jest ryba.)"),
    ("deser", "el postre", "¿Qué hay de postre? (Co jest na deser?)"),
    ("kelner", "el camarero", "El camarero es muy amable. (Kelner jest bardzo miły.)"),
    ("rezerwacja", "la reserva", "Tengo una reserva para dos. (Mam rezerwację dla dwóch osób.)"),
    ("stolik", "la mesa", "¿Tiene una mesa libre? (Czy ma pan wolny stolik?)"),
    ("napój", "la bebida", "¿Qué bebida quieres? (Jaki napój chcesz?)"),
    ("smacznego", "buen provecho", "¡Buen provecho! (Smacznego!)"),
];

const SHOPPING: &[Entry] = &[
    ("sklep", "la tienda", "La tienda está cerrada. (Sklep jest zamknięty.)"),
    ("przymierzać", "probarse", "Me pruebo estos pantalones. (Przymierzam te spodnie.)"),
    ("rozmiar", "la talla", "¿Qué talla necesitas? (Jakiego rozmiaru potrzebujesz?)"),
    ("przecena", "la rebaja", "Hay rebajas en esta tienda. (W tym sklepie są przeceny.)"),
    ("kasa", "la caja", "La caja está al fondo. (Kasa jest w głębi.)"),
    ("przymierzalnia", "el probador", "El probador está ocupado. (Przymierzalnia jest zajęta.)"),
    ("paragon", "el ticket", "¿Necesita el ticket? (Potrzebuje pan paragon?)"),
    ("koszyk", "la cesta", "Cojo una cesta para comprar. (Biorę koszyk na zakupy.)"),
    ("promocja", "la oferta", "Hay una oferta especial. (Jest specjalna promocja.)"),
    ("płacić", "pagar", "¿Cómo quiere pagar? (Jak chce pan zapłacić?)"),
];

const HEALTH: &[Entry] = &[
    ("ból głowy", "el dolor de cabeza", "Tengo dolor de cabeza. (Boli mnie głowa.)"),
    ("gorączka", "la fiebre", "Tiene fiebre alta. (Ma wysoką gorączkę.)"),
    ("przeziębienie", "el resfriado", "Estoy resfriado. (Jestem przeziębiony.)"),
    ("apteka", "la farmacia", "La farmacia está cerca. (Apteka jest blisko.)"),
    ("recepta", "la receta", "Necesito una receta. (Potrzebuję recepty.)"),
    ("lekarz", "el médico", "Voy al médico mañana. (Idę do lekarza jutro.)"),
    ("tabletka", "la pastilla", "Tomo una pastilla cada día. (Biorę tabletkę codziennie.)"),
    ("syrop", "el jarabe", "El jarabe es para la tos. (Syrop jest na kaszel.)"),
    ("alergia", "la alergia", "Tengo alergia al polen. (Mam alergię na pyłki.)"),
    ("wizyta", "la cita", "Tengo una cita con el dentista. (Mam wizytę u dentysty.)"),
];

const TRAVEL: &[Entry] = &[
    ("bilet", "el billete", "Necesito un billete de ida y vuelta. (Potrzebuję bilet w obie strony.)"),
    ("walizka", "la maleta", "Mi maleta es grande. (Moja walizka jest duża.)"),
    ("lotnisko", "el aeropuerto", "El aeropuerto está lejos. (Lotnisko jest daleko.)"),
    ("paszport", "el pasaporte", "¿Dónde está mi pasaporte? (Gdzie jest mój paszport?)"),
    ("rezerwacja hotelu", "la reserva de hotel", "Tengo una reserva de hotel. (Mam rezerwację hotelu.)"),
    ("zwiedzać", "visitar", "Quiero visitar el museo. (Chcę zwiedzić muzeum.)"),
    ("mapa", "el mapa", "Necesito un mapa de la ciudad. (Potrzebuję mapę miasta.)"),
    ("zagubiony", "perdido", "Estoy perdido. (Jestem zagubiony.)"),
    ("kierunek", "la dirección", "¿Cuál es la dirección? (Jaki jest kierunek?)"),
    ("dworzec", "la estación", "La estación está cerca. (Dworzec jest blisko.)"),
];

impl TopicTable {
    /// Every topic must hold enough entries for the smallest batch.
    pub fn new(topics: Vec<Topic>) -> Result<Self, FiszkiError> {
        if topics.is_empty() {
            return Err(FiszkiError::InvalidTopic("at least one topic is required".to_string()));
        }
        if let Some(topic) = topics.iter().find(|t| t.entries.len() < MIN_SUGGESTIONS) {
            return Err(FiszkiError::InvalidTopic(format!(
                "topic {} has {} entries, at least {MIN_SUGGESTIONS} are required",
                topic.key,
                topic.entries.len()
            )));
        }
        Ok(Self { topics })
    }

    pub fn builtin() -> Self {
        let topics = [
            ("daily_routines", DAILY_ROUTINES),
            ("food_and_restaurant", FOOD_AND_RESTAURANT),
            ("shopping", SHOPPING),
            ("health", HEALTH),
            ("travel", TRAVEL),
        ]
        .into_iter()
        .map(|(key, entries)| Topic {
            key: key.to_string(),
            entries: entries
                .iter()
                .map(|(source, target, example)| FlashcardSuggestion::new(source, target, example))
                .collect(),
        })
        .collect();

        Self { topics }
    }

    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    pub fn get(&self, key: &str) -> Option<&Topic> {
        self.topics.iter().find(|t| t.key == key)
    }

    pub fn contains(&self, suggestion: &FlashcardSuggestion) -> bool {
        self.topics.iter().any(|t| t.entries.contains(suggestion))
    }
}

/// Offline suggestion source: topic draw, count draw, shuffle, slice.
pub struct MockSuggestionSource {
    table: TopicTable,
    random: Mutex<Box<dyn RandomSource>>,
}

impl MockSuggestionSource {
    pub fn new(table: TopicTable, random: Box<dyn RandomSource>) -> Self {
        Self { table, random: Mutex::new(random) }
    }

    pub fn table(&self) -> &TopicTable {
        &self.table
    }

    pub fn generate(&self) -> Vec<FlashcardSuggestion> {
        // A poisoned lock only means another draw panicked; the source itself is still usable.
        let mut random = self.random.lock().unwrap_or_else(|e| e.into_inner());

        let topic = &self.table.topics[pick_index(random.next_f64(), self.table.topics.len())];
        let count = MIN_SUGGESTIONS
            + pick_index(random.next_f64(), MAX_SUGGESTIONS - MIN_SUGGESTIONS + 1);

        // Stable sort on one draw per entry, so equal draws keep the table order.
        let mut keyed: Vec<(f64, &FlashcardSuggestion)> =
            topic.entries.iter().map(|entry| (random.next_f64(), entry)).collect();
        keyed.sort_by(|a, b| a.0.total_cmp(&b.0));

        debug!(topic = %topic.key, count, "Generated mock suggestions");

        keyed.into_iter().take(count).map(|(_, entry)| entry.clone()).collect()
    }
}

impl Default for MockSuggestionSource {
    fn default() -> Self {
        Self::new(TopicTable::builtin(), Box::new(SystemRandom::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SequenceRandom;

    #[test]
    fn test_scripted_selection() {
        // 0.3 -> topic 1 of 5, 0.4 -> floor(2.4) + 5 = 7 cards, 0.5 for every shuffle draw
        let source = MockSuggestionSource::new(
            TopicTable::builtin(),
            Box::new(SequenceRandom::new([0.3, 0.4], 0.5)),
        );

        let result = source.generate();
        let food = source.table().get("food_and_restaurant").unwrap();

        assert_eq!(result.len(), 7);
        assert_eq!(result[0].target_word, "pedir");
        assert_eq!(result, food.entries[..7].to_vec());
    }

    #[test]
    fn test_shuffle_follows_draws() {
        let table = TopicTable::new(vec![Topic {
            key: "tiny".to_string(),
            entries: (0..6)
                .map(|i| FlashcardSuggestion::new(&format!("s{i}"), &format!("t{i}"), "e (f)"))
                .collect(),
        }])
        .unwrap();
        // topic, count (floor(0.0 * 6) + 5 = 5), then one draw per entry
        let source = MockSuggestionSource::new(
            table,
            Box::new(SequenceRandom::new([0.0, 0.0, 0.9, 0.1, 0.5, 0.3, 0.7, 0.2], 0.0)),
        );

        let words: Vec<String> = source.generate().into_iter().map(|s| s.target_word).collect();
        assert_eq!(words, vec!["t1", "t5", "t3", "t2", "t4"]);
    }

    #[test]
    fn test_count_and_pool_bounds() {
        let source = MockSuggestionSource::default();
        for _ in 0..200 {
            let result = source.generate();
            assert!((MIN_SUGGESTIONS..=MAX_SUGGESTIONS).contains(&result.len()));
            assert!(result.iter().all(|s| source.table().contains(s)));

            let key = source
                .table()
                .topics()
                .iter()
                .find(|t| t.entries.contains(&result[0]))
                .map(|t| t.key.clone())
                .unwrap();
            let topic = source.table().get(&key).unwrap();
            assert!(result.iter().all(|s| topic.entries.contains(s)));
        }
    }

    #[test]
    fn test_builtin_examples_carry_translation() {
        let table = TopicTable::builtin();
        assert_eq!(table.topics().len(), 5);
        for topic in table.topics() {
            assert_eq!(topic.entries.len(), 10);
            for entry in &topic.entries {
                assert!(entry.example_sentence.trim_end().ends_with(')'), "{:?}", entry);
            }
        }
    }

    #[test]
    fn test_table_rejects_short_topics() {
        assert!(matches!(TopicTable::new(Vec::new()), Err(FiszkiError::InvalidTopic(_))));

        let topic = |key: &str, size: usize| Topic {
            key: key.to_string(),
            entries: (0..size)
                .map(|i| FlashcardSuggestion::new(&format!("s{i}"), &format!("t{i}"), "e (f)"))
                .collect(),
        };

        let err = TopicTable::new(vec![topic("ok", 10), topic("short", MIN_SUGGESTIONS - 1)])
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid topic table: topic short has 4 entries, at least 5 are required"
        );

        // A topic at the minimum still yields a full batch.
        let source = MockSuggestionSource::new(
            TopicTable::new(vec![topic("small", MIN_SUGGESTIONS)]).unwrap(),
            Box::new(SequenceRandom::new([0.0, 0.99], 0.5)),
        );
        assert_eq!(source.generate().len(), MIN_SUGGESTIONS);
    }
}
