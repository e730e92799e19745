use crate::models::sentiment::Aspect;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubcategoryDefinition {
    pub name: &'static str,
    pub aspect: Aspect,
    pub definition: &'static str,
    pub keywords: &'static str,
}

const fn def(
    name: &'static str,
    aspect: Aspect,
    definition: &'static str,
    keywords: &'static str,
) -> SubcategoryDefinition {
    SubcategoryDefinition {
        name,
        aspect,
        definition,
        keywords,
    }
}

pub static SUBCATEGORIES: &[SubcategoryDefinition] = &[
    // Food
    def(
        "food_quality",
        Aspect::Food,
        "Physical condition and preparation of food ONLY. Temperature (hot/cold), cooking level (undercooked/overcooked/burnt), texture, consistency.",
        "cold, hot, soggy, burnt, overcooked, undercooked, raw, stale, tough, mushy, dry, greasy",
    ),
    def(
        "food_taste",
        Aspect::Food,
        "Flavor and seasoning ONLY. How food tastes, spice level, saltiness, sweetness, blandness.",
        "delicious, tasty, bland, flavorless, too salty, too sweet, spicy, disgusting, yummy, awful taste",
    ),
    def(
        "food_freshness",
        Aspect::Food,
        "Age and freshness of ingredients ONLY. Spoilage, expired items, wilted produce, old bread.",
        "fresh, stale, rotten, expired, wilted, moldy, old, spoiled, past date",
    ),
    def(
        "food_presentation",
        Aspect::Food,
        "Visual appearance and plating ONLY. How food looks, arrangement, garnish, mess.",
        "beautiful, pretty, ugly, messy, well-plated, sloppy, appealing, unappetizing presentation",
    ),
    // Delivery
    def(
        "delivery_speed",
        Aspect::Delivery,
        "Time taken for delivery ONLY. Fast, slow, late, early, on-time arrival.",
        "fast, slow, late, early, on time, quick, took forever, arrived promptly, delayed",
    ),
    def(
        "delivery_reliability",
        Aspect::Delivery,
        "Accuracy and dependability ONLY. Wrong items, missing items, wrong address, order mix-ups.",
        "wrong order, missing items, incorrect, forgot, mixed up, reliable, accurate, complete",
    ),
    def(
        "driver_behavior",
        Aspect::Delivery,
        "Driver's conduct and professionalism ONLY. Politeness, rudeness, communication, appearance.",
        "rude driver, polite, friendly, unprofessional, nice, attitude, courteous, disrespectful",
    ),
    def(
        "packaging_quality",
        Aspect::Delivery,
        "Physical packaging condition ONLY. Sealed, damaged, leaking, secure containers, bags.",
        "leaked, spilled, damaged packaging, sealed, secure, broken, good packaging, mess",
    ),
    // Service
    def(
        "customer_support",
        Aspect::Service,
        "Help from support team ONLY. Response to complaints, refunds, issue resolution, chat/phone support.",
        "customer service, support, refund, complaint, help, contact, resolved, unresponsive support",
    ),
    def(
        "staff_attitude",
        Aspect::Service,
        "Restaurant staff behavior ONLY (not driver). Kitchen staff, order takers, management attitude.",
        "restaurant staff, manager, kitchen, employees, workers, staff rude, helpful staff",
    ),
    def(
        "responsiveness",
        Aspect::Service,
        "Speed of communication ONLY. How fast support/restaurant responds to messages or calls.",
        "quick response, slow to respond, ignored, replied fast, no answer, responsive",
    ),
    // Price
    def(
        "value_for_money",
        Aspect::Price,
        "Worth relative to cost ONLY. Portion size vs price, quality vs cost, overpriced, good deal.",
        "overpriced, worth it, expensive, cheap, good value, small portions, bang for buck, ripoff",
    ),
    def(
        "fees_charges",
        Aspect::Price,
        "Extra costs ONLY. Delivery fees, service fees, hidden charges, surcharges, tips.",
        "delivery fee, service charge, hidden fee, surcharge, extra cost, tip, fees too high",
    ),
    def(
        "discounts_promotions",
        Aspect::Price,
        "Deals and offers ONLY. Coupons, promo codes, sales, discounts, loyalty rewards.",
        "discount, promo, coupon, deal, offer, sale, free delivery, rewards, promotion",
    ),
    def(
        "pricing_fairness",
        Aspect::Price,
        "Pricing transparency and honesty ONLY. Unexpected charges, price matching menu, billing errors.",
        "charged wrong, billing error, price mismatch, fair pricing, honest, incorrect charge",
    ),
    // Interface
    def(
        "app_usability",
        Aspect::Interface,
        "Ease of use ONLY. User-friendliness, confusing interface, smooth experience, bugs, crashes.",
        "easy to use, confusing, crashed, buggy, smooth, glitchy, user-friendly, hard to navigate",
    ),
    def(
        "navigation",
        Aspect::Interface,
        "Finding things in app ONLY. Menu organization, search function, finding restaurants/items.",
        "hard to find, search works, menu layout, organized, can't find, browse, filter",
    ),
    def(
        "app_features",
        Aspect::Interface,
        "Specific functionalities ONLY. Tracking, payment options, reorder, customization, notifications.",
        "tracking, payment, reorder, customize, notifications, options, features, functionality",
    ),
    // Overall
    def(
        "overall_satisfaction",
        Aspect::Overall,
        "General experience without specific details. Vague positive/negative statements, would recommend, overall impression.",
        "great experience, terrible, recommend, never again, overall, satisfied, disappointed, happy",
    ),
];
